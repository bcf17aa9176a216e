//! Encoder of [`ManiaChart`] into chart text.

use std::{
    fmt::{self, Write as _},
    io,
};

use rosu_map::{
    Beatmap,
    section::{
        hit_objects::{
            HitObject as BeatmapObject, HitObjectCircle, HitObjectHold,
            HitObjectKind as BeatmapObjectKind,
        },
        timing_points::{ControlPoints, TimingPoint as BeatmapTimingPoint},
    },
    util::Pos,
};

use super::{
    HitObject, HitObjectKind, ManiaChart,
    storyboard::{Layer, Storyboard, StoryboardSprite},
};

const EVENTS_HEADER: &str = "[Events]";

impl ManiaChart {
    /// Writes the chart in the current text format.
    ///
    /// The sections are encoded by [`rosu_map`], and the storyboard sprites are appended to the end
    /// of its `[Events]` section.
    ///
    /// # Errors
    ///
    /// Returns the error of the [`rosu_map`] encoder.
    pub fn unparse(&self) -> io::Result<String> {
        let encoded = self.to_beatmap().encode_to_string()?;
        let mut sprites = String::new();
        // Writing into a String cannot fail.
        let _ = write_storyboard(&mut sprites, &self.events.storyboard);
        Ok(splice_events(&encoded, &sprites))
    }

    fn to_beatmap(&self) -> Beatmap {
        let general = &self.general;
        let editor = &self.editor;
        let metadata = &self.metadata;
        let difficulty = &self.difficulty;
        Beatmap {
            format_version: self.version,
            audio_file: general.audio_filename.clone(),
            audio_lead_in: general.audio_lead_in as _,
            preview_time: general.preview_time,
            countdown: general.countdown,
            stack_leniency: general.stack_leniency,
            mode: general.mode,
            letterbox_in_breaks: general.letterbox_in_breaks,
            special_style: general.special_style,
            widescreen_storyboard: general.widescreen_storyboard,
            distance_spacing: editor.distance_spacing,
            beat_divisor: editor.beat_divisor,
            grid_size: editor.grid_size,
            timeline_zoom: editor.timeline_zoom,
            title: metadata.title.clone(),
            title_unicode: metadata.title_unicode.clone(),
            artist: metadata.artist.clone(),
            artist_unicode: metadata.artist_unicode.clone(),
            creator: metadata.creator.clone(),
            version: metadata.version.clone(),
            source: metadata.source.clone(),
            tags: metadata.tags.join(" "),
            beatmap_id: metadata.beatmap_id,
            beatmap_set_id: metadata.beatmap_set_id,
            hp_drain_rate: difficulty.hp_drain_rate,
            circle_size: difficulty.circle_size,
            overall_difficulty: difficulty.overall_difficulty,
            approach_rate: difficulty.approach_rate,
            slider_multiplier: difficulty.slider_multiplier,
            slider_tick_rate: difficulty.slider_tick_rate,
            background_file: self.events.background_image.clone(),
            control_points: ControlPoints {
                timing_points: self
                    .timing_points
                    .iter()
                    .map(|point| BeatmapTimingPoint {
                        time: point.time,
                        beat_len: point.beat_length,
                        ..BeatmapTimingPoint::default()
                    })
                    .collect(),
                ..ControlPoints::default()
            },
            hit_objects: self.hit_objects.iter().map(HitObject::to_beatmap_object).collect(),
            ..Beatmap::default()
        }
    }
}

impl HitObject {
    fn to_beatmap_object(&self) -> BeatmapObject {
        let kind = match self.kind {
            HitObjectKind::Circle => BeatmapObjectKind::Circle(HitObjectCircle {
                pos: Pos::new(self.x as f32, self.y as f32),
                new_combo: false,
                combo_offset: 0,
            }),
            HitObjectKind::Hold => BeatmapObjectKind::Hold(HitObjectHold {
                pos_x: self.x as f32,
                duration: (i64::from(self.end_time) - i64::from(self.start_time)) as f64,
            }),
        };
        BeatmapObject {
            start_time: f64::from(self.start_time),
            kind,
            samples: Vec::new(),
        }
    }
}

/// Inserts `sprites` at the end of the `[Events]` section of `encoded`.
fn splice_events(encoded: &str, sprites: &str) -> String {
    if sprites.is_empty() {
        return encoded.to_string();
    }
    let Some(events) = encoded.find(EVENTS_HEADER) else {
        return format!("{encoded}\n{EVENTS_HEADER}\n{sprites}");
    };
    let body = events + EVENTS_HEADER.len();
    let end = encoded
        .get(body..)
        .and_then(|rest| rest.find("\n["))
        .map_or(encoded.len(), |offset| body + offset + 1);
    let (section, rest) = encoded.split_at(end);
    format!("{}\n{sprites}\n{rest}", section.trim_end())
}

fn write_storyboard(out: &mut String, storyboard: &Storyboard) -> fmt::Result {
    for layer in [Layer::Background, Layer::Foreground] {
        for sprite in storyboard.layer(layer) {
            write_sprite(out, layer, sprite)?;
        }
    }
    Ok(())
}

fn write_sprite(out: &mut String, layer: Layer, sprite: &StoryboardSprite) -> fmt::Result {
    writeln!(
        out,
        "Sprite,{},{},\"{}\",{},{}",
        layer.name(),
        sprite.origin,
        sprite.path,
        sprite.x,
        sprite.y
    )?;
    for command in &sprite.commands {
        write!(
            out,
            " {},{},{},",
            command.code, command.easing, command.start_time
        )?;
        if command.end_time != command.start_time {
            write!(out, "{}", command.end_time)?;
        }
        if command.params.is_empty() {
            writeln!(out)?;
        } else {
            writeln!(out, ",{}", command.params)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mania::{
        parse::{ChartParseOutput, parse_chart},
        storyboard::{Command, Origin},
    };

    #[test]
    fn template_chart_survives_decode() {
        let mut chart = ManiaChart::intralism_template();
        chart.general.audio_filename = "music.ogg".into();
        chart.metadata.title = "Song".into();
        chart.metadata.tags = vec!["a".into(), "b".into()];
        chart.events.background_image = "bg.png".into();
        let mut sprite = StoryboardSprite::new(Origin::Centre, "bg.png");
        sprite.commands.push(Command::visibility(0, 90_000));
        chart.events.storyboard.background.push(sprite);
        chart.hit_objects = vec![HitObject::circle(64, 100), HitObject::circle(320, 250)];
        let mut hold = HitObject::circle(448, 300);
        hold.kind = HitObjectKind::Hold;
        hold.end_time = 600;
        chart.hit_objects.push(hold);

        let ChartParseOutput {
            chart: decoded,
            warnings,
        } = parse_chart(&chart.unparse().unwrap()).unwrap();
        assert_eq!(warnings, vec![]);
        assert_eq!(decoded, chart);
    }

    #[test]
    fn writes_visibility_command() {
        let mut chart = ManiaChart::intralism_template();
        let mut sprite = StoryboardSprite::new(Origin::Centre, "fx.png");
        sprite.commands.push(Command::visibility(1000, 2000));
        chart.events.storyboard.foreground.push(sprite);
        let text = chart.unparse().unwrap();
        assert!(text.contains(
            "Sprite,Foreground,Centre,\"fx.png\",320,240\n C,0,1000,2000,255,255,255,255,255,255\n"
        ));
        let events = text.find("[Events]").unwrap();
        let sprite = text.find("Sprite,").unwrap();
        let timing = text.find("[TimingPoints]").unwrap();
        assert!(events < sprite && sprite < timing);
    }

    #[test]
    fn sprites_go_to_the_end_of_events() {
        let encoded = "[Events]\n//Background\n0,0,\"bg.png\",0,0\n\n[TimingPoints]\n0,500\n";
        assert_eq!(
            splice_events(encoded, "Sprite,Background,Centre,\"a.png\",320,240\n"),
            "[Events]\n//Background\n0,0,\"bg.png\",0,0\nSprite,Background,Centre,\"a.png\",320,240\n\n[TimingPoints]\n0,500\n"
        );
        assert_eq!(splice_events(encoded, ""), encoded);
    }
}
