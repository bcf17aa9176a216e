use std::path::Path;

use intralism_mania::{
    audio::ProbeError,
    intralism::{
        LevelResource,
        event::{EventPayload, MAP_END, SHOW_SPRITE, SPAWN_OBJ},
        mania_to_intralism::{ManiaToIntralismOutput, ManiaToIntralismWarning},
    },
    mania::{
        HitObject, ManiaChart,
        parse::{ChartParseOutput, ChartParseWarning, parse_chart},
        storyboard::{Command, Origin, StoryboardSprite},
    },
};
use pretty_assertions::assert_eq;

fn twelve_seconds(_: &Path) -> Result<f64, ProbeError> {
    Ok(12.0)
}

fn sample() -> ManiaChart {
    let ChartParseOutput { chart, warnings } =
        parse_chart(include_str!("files/sample.osu")).expect("must be parsed");
    assert_eq!(
        warnings,
        vec![ChartParseWarning::UnsupportedStoryboard {
            content: "Animation,Foreground,Centre,\"SB\\spark.png\",320,240,4,50,LoopForever"
                .into(),
            line: 58,
        }]
    );
    chart
}

fn sprite(path: &str, start: i32, end: i32) -> StoryboardSprite {
    let mut sprite = StoryboardSprite::new(Origin::Centre, path);
    sprite.commands.push(Command::visibility(start, end));
    sprite
}

#[test]
fn converts_sample_chart() {
    let ManiaToIntralismOutput {
        beatmap,
        image_paths,
        warnings,
    } = sample()
        .to_intralism(Path::new("tests/files"), &twelve_seconds)
        .expect("must be converted");

    assert_eq!(beatmap.name, "Lumen - Night Drive");
    assert_eq!(
        beatmap.info,
        "Mania convert https://osu.ppy.sh/beatmapsets/1122334/discussion/2345678 by mapper"
    );
    assert_eq!(beatmap.music_time, 12.0);
    assert_eq!(beatmap.icon_file, "bg.jpg");
    assert_eq!(
        beatmap.level_resources,
        vec![
            LevelResource::sprite("bg.jpg"),
            LevelResource::sprite("city.png"),
            LevelResource::sprite("flash.png"),
        ]
    );
    assert_eq!(image_paths, vec!["bg.jpg", "SB\\city.png", "flash.png"]);

    let events: Vec<_> = beatmap
        .events
        .iter()
        .map(|event| (event.time, event.kind(), event.payload()))
        .collect();
    assert_eq!(
        events,
        vec![
            (0.0, SHOW_SPRITE, "bg.jpg,0,True,0,0,0"),
            (1.0, SHOW_SPRITE, "city.png,0,True,3000,0,0"),
            (2.5, SHOW_SPRITE, "flash.png,1,True,500,0,0"),
            (0.0, SPAWN_OBJ, "[Left-Right]"),
            (0.25, SPAWN_OBJ, "[Up]"),
            (0.5, SPAWN_OBJ, "[Down]"),
            (1.001, SPAWN_OBJ, "[Left]"),
            (1.333, SPAWN_OBJ, "[Up-Right]"),
            (12.0, MAP_END, "12"),
        ]
    );
    assert_eq!(
        warnings,
        vec![
            ManiaToIntralismWarning::SpriteWithoutCommands {
                path: "SB\\empty.png".into()
            },
            ManiaToIntralismWarning::SkippedHitObject { x: 256, time: 750 },
        ]
    );
}

#[test]
fn simultaneous_notes_share_one_spawn() {
    let mut chart = ManiaChart::intralism_template();
    chart.hit_objects = vec![
        HitObject::circle(64, 100),
        HitObject::circle(448, 100),
        HitObject::circle(192, 250),
    ];
    let beatmap = chart
        .to_intralism(Path::new("."), &twelve_seconds)
        .expect("must be converted")
        .beatmap;
    let spawns: Vec<_> = beatmap
        .events_of_kind(SPAWN_OBJ)
        .map(|event| (event.time, event.payload()))
        .collect();
    assert_eq!(spawns, vec![(0.1, "[Left-Right]"), (0.25, "[Up]")]);
}

#[test]
fn first_event_is_background_at_zero() {
    let charts = [
        sample(),
        ManiaChart::intralism_template(),
        ManiaChart {
            hit_objects: vec![HitObject::circle(64, 0)],
            ..ManiaChart::intralism_template()
        },
    ];
    for chart in charts {
        let beatmap = chart
            .to_intralism(Path::new("."), &twelve_seconds)
            .expect("must be converted")
            .beatmap;
        let first = &beatmap.events[0];
        assert!(first.is_of_kind(SHOW_SPRITE));
        assert!(first.is_background_layer());
        assert_eq!(first.time, 0.0);
    }
}

#[test]
fn off_lane_objects_are_dropped_silently() {
    let mut chart = ManiaChart::intralism_template();
    chart.hit_objects = vec![HitObject::circle(0, 100), HitObject::circle(320, 100)];
    let output = chart
        .to_intralism(Path::new("."), &twelve_seconds)
        .expect("must be converted");
    let spawns: Vec<_> = output
        .beatmap
        .events_of_kind(SPAWN_OBJ)
        .map(|event| event.decode().expect("must be decoded"))
        .collect();
    assert_eq!(spawns.len(), 1);
    assert!(matches!(&spawns[0], EventPayload::SpawnNotes { lanes } if lanes.len() == 1));
}

#[test]
fn same_file_name_is_one_resource() {
    let mut chart = ManiaChart::intralism_template();
    chart.events.background_image = "bg.jpg".into();
    chart.events.storyboard.background = vec![sprite("SB/glow.png", 0, 1000)];
    chart.events.storyboard.foreground = vec![sprite("glow.png", 2000, 3000)];
    let beatmap = chart
        .to_intralism(Path::new("."), &twelve_seconds)
        .expect("must be converted")
        .beatmap;
    assert_eq!(beatmap.sprite_names().filter(|&name| name == "glow.png").count(), 2);
    assert_eq!(
        beatmap
            .level_resources
            .iter()
            .filter(|resource| resource.name == "glow.png")
            .count(),
        1
    );
}
