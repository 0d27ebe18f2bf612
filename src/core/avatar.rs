//! Avatar appearance and mood driven animation.
//!
//! Everything here is a plain function of (elapsed seconds, mood, speaking flag) and,
//! where a value eases over time, the previous frame. No rendering types leak in, so the
//! client can drive any scene graph from these numbers.

use crate::core::mood::Mood;
use serde::{Deserialize, Serialize};

const HEAD_REST_Y: f32 = 0.5;
const BREATH_RATE: f32 = 2.0;
const BREATH_HEAD_AMPLITUDE: f32 = 0.02;
const BREATH_BODY_AMPLITUDE: f32 = 0.01;

const SPEECH_RATE: f32 = 10.0;
const SPEECH_BOB_AMPLITUDE: f32 = 0.02;
const MOUTH_REST: f32 = 0.3;

const BLINK_RATE: f32 = 2.0;
const BLINK_CYCLE: i64 = 5;
const EYES_CLOSED: f32 = 0.1;

const HEAD_EASE: f32 = 0.05;
const MOUTH_EASE: f32 = 0.1;
const EYE_EASE: f32 = 0.2;

const EXTERNAL_SWAY_RATE: f32 = 3.0;
const EXTERNAL_SWAY_AMPLITUDE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HairStyle {
    Short,
    Long,
}

/// Colours are `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarCustomization {
    pub skin_tone: String,
    pub eye_color: String,
    pub hair_style: HairStyle,
    pub hair_color: String,
    pub clothing_color: String,
}

impl Default for AvatarCustomization {
    fn default() -> Self {
        Self {
            skin_tone: "#f5d5b8".to_owned(),
            eye_color: "#4a90e2".to_owned(),
            hair_style: HairStyle::Short,
            hair_color: "#4a3728".to_owned(),
            clothing_color: "#667eea".to_owned(),
        }
    }
}

impl AvatarCustomization {
    /// Returns the name of the first field that is not a `#rrggbb` colour.
    pub fn invalid_color(&self) -> Option<&'static str> {
        [
            ("skinTone", &self.skin_tone),
            ("eyeColor", &self.eye_color),
            ("hairColor", &self.hair_color),
            ("clothingColor", &self.clothing_color),
        ]
        .into_iter()
        .find(|(_, value)| !is_hex_color(value))
        .map(|(field, _)| field)
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderSource {
    /// Built from primitive meshes coloured by the customization.
    Procedural,
    /// Loaded from `model_url`.
    External,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarProfile {
    pub customization: AvatarCustomization,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_url: Option<String>,
}

impl AvatarProfile {
    pub fn render_source(&self) -> RenderSource {
        match self.model_url {
            Some(_) => RenderSource::External,
            None => RenderSource::Procedural,
        }
    }
}

/// Target pose for a mood: head tilt in radians, eye and mouth scale relative to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodPose {
    pub head_tilt: f32,
    pub eye_scale: f32,
    pub mouth_scale: f32,
}

impl MoodPose {
    pub const NEUTRAL: MoodPose = MoodPose {
        head_tilt: 0.0,
        eye_scale: 1.0,
        mouth_scale: 1.0,
    };

    pub fn for_mood(mood: Mood) -> MoodPose {
        match mood {
            Mood::Happy => MoodPose {
                head_tilt: 0.1,
                eye_scale: 1.2,
                mouth_scale: 1.3,
            },
            Mood::Sad => MoodPose {
                head_tilt: -0.15,
                eye_scale: 0.8,
                mouth_scale: 0.7,
            },
            Mood::Excited => MoodPose {
                head_tilt: 0.2,
                eye_scale: 1.4,
                mouth_scale: 1.5,
            },
            Mood::Calm => MoodPose::NEUTRAL,
            _ => MoodPose::NEUTRAL,
        }
    }

    /// Unknown labels use the neutral pose.
    pub fn for_label(label: &str) -> MoodPose {
        MoodPose::for_mood(Mood::from_label(label))
    }
}

/// One animation frame for the procedural avatar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub head_y: f32,
    pub head_tilt: f32,
    pub eye_open: f32,
    pub mouth_open: f32,
    pub body_scale_y: f32,
}

impl Default for PoseFrame {
    fn default() -> Self {
        Self {
            head_y: HEAD_REST_Y,
            head_tilt: 0.0,
            eye_open: 1.0,
            mouth_open: MOUTH_REST,
            body_scale_y: 1.0,
        }
    }
}

/// Frame transform for an externally loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelFrame {
    pub rotation_y: f32,
    pub offset_y: f32,
}

pub fn lerp(from: f32, to: f32, factor: f32) -> f32 {
    from + (to - from) * factor
}

pub fn breathing_offset(elapsed: f32) -> f32 {
    (elapsed * BREATH_RATE).sin()
}

/// Mouth opening while talking, independent of mood.
pub fn speaking_mouth(elapsed: f32) -> f32 {
    MOUTH_REST + (elapsed * SPEECH_RATE).sin() * 0.1 + 0.1
}

pub fn speaking_bob(elapsed: f32) -> f32 {
    (elapsed * SPEECH_RATE).sin() * SPEECH_BOB_AMPLITUDE
}

/// Eyes are shut for the first half-second slot of every 2.5 second cycle.
pub fn is_blinking(elapsed: f32) -> bool {
    ((elapsed * BLINK_RATE).floor() as i64).rem_euclid(BLINK_CYCLE) == 0
}

/// Advances `previous` to `elapsed` seconds for `mood`.
pub fn next_frame(previous: &PoseFrame, elapsed: f32, mood: Mood, speaking: bool) -> PoseFrame {
    let target = MoodPose::for_mood(mood);
    let breath = breathing_offset(elapsed);

    let mut head_y = HEAD_REST_Y + breath * BREATH_HEAD_AMPLITUDE;
    let mouth_open = if speaking {
        head_y += speaking_bob(elapsed);
        speaking_mouth(elapsed)
    } else {
        lerp(previous.mouth_open, target.mouth_scale * MOUTH_REST, MOUTH_EASE)
    };

    let eye_open = if is_blinking(elapsed) {
        EYES_CLOSED
    } else {
        lerp(previous.eye_open, target.eye_scale, EYE_EASE)
    };

    PoseFrame {
        head_y,
        head_tilt: lerp(previous.head_tilt, target.head_tilt, HEAD_EASE),
        eye_open,
        mouth_open,
        body_scale_y: 1.0 + breath * BREATH_BODY_AMPLITUDE,
    }
}

pub fn external_model_frame(elapsed: f32, mood: Mood, speaking: bool) -> ModelFrame {
    let rotation_y = match mood {
        Mood::Excited => (elapsed * EXTERNAL_SWAY_RATE).sin() * EXTERNAL_SWAY_AMPLITUDE,
        _ => 0.0,
    };
    let offset_y = if speaking { speaking_bob(elapsed) } else { 0.0 };

    ModelFrame {
        rotation_y,
        offset_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn pose_table_matches_moods() {
        let happy = MoodPose::for_mood(Mood::Happy);
        assert_eq!((happy.head_tilt, happy.eye_scale, happy.mouth_scale), (0.1, 1.2, 1.3));

        let sad = MoodPose::for_mood(Mood::Sad);
        assert_eq!((sad.head_tilt, sad.eye_scale, sad.mouth_scale), (-0.15, 0.8, 0.7));

        let excited = MoodPose::for_mood(Mood::Excited);
        assert_eq!(
            (excited.head_tilt, excited.eye_scale, excited.mouth_scale),
            (0.2, 1.4, 1.5)
        );

        assert_eq!(MoodPose::for_mood(Mood::Calm), MoodPose::NEUTRAL);
        assert_eq!(MoodPose::for_mood(Mood::Lonely), MoodPose::NEUTRAL);
    }

    #[test]
    fn excited_and_sad_sit_on_opposite_sides_of_neutral() {
        let excited = MoodPose::for_mood(Mood::Excited);
        let sad = MoodPose::for_mood(Mood::Sad);
        assert!(excited.eye_scale > 1.0 && sad.eye_scale < 1.0);
        assert!(excited.mouth_scale > 1.0 && sad.mouth_scale < 1.0);
    }

    #[test]
    fn unknown_labels_fall_back_to_neutral() {
        assert_eq!(MoodPose::for_label("bewildered"), MoodPose::NEUTRAL);
        assert_eq!(MoodPose::for_label(""), MoodPose::NEUTRAL);
        assert_eq!(MoodPose::for_label("HAPPY"), MoodPose::for_mood(Mood::Happy));
    }

    #[test]
    fn blink_cycle() {
        assert!(is_blinking(0.0));
        assert!(is_blinking(0.49));
        assert!(!is_blinking(0.5));
        assert!(!is_blinking(2.0));
        assert!(is_blinking(2.5));
        assert!(is_blinking(5.1));
    }

    #[test]
    fn eyes_snap_shut_while_blinking() {
        let frame = next_frame(&PoseFrame::default(), 0.1, Mood::Excited, false);
        assert_close(frame.eye_open, EYES_CLOSED);
    }

    #[test]
    fn eyes_ease_toward_mood_between_blinks() {
        let frame = next_frame(&PoseFrame::default(), 1.0, Mood::Excited, false);
        assert_close(frame.eye_open, 1.0 + (1.4 - 1.0) * 0.2);
    }

    #[test]
    fn head_tilt_eases_slowly() {
        let frame = next_frame(&PoseFrame::default(), 1.0, Mood::Sad, false);
        assert_close(frame.head_tilt, -0.15 * 0.05);

        let mut frame = PoseFrame::default();
        for step in 0..400 {
            frame = next_frame(&frame, 1.0 + step as f32 / 60.0, Mood::Sad, false);
        }
        assert_close(frame.head_tilt, -0.15);
    }

    #[test]
    fn speaking_overrides_mouth_and_bobs_head() {
        let elapsed = 0.7;
        let quiet = next_frame(&PoseFrame::default(), elapsed, Mood::Sad, false);
        let talking = next_frame(&PoseFrame::default(), elapsed, Mood::Sad, true);

        assert_close(talking.mouth_open, speaking_mouth(elapsed));
        assert_close(talking.head_y - quiet.head_y, speaking_bob(elapsed));
        assert_close(quiet.mouth_open, lerp(MOUTH_REST, 0.7 * MOUTH_REST, 0.1));
        // mood still drives the rest of the pose
        assert_close(talking.head_tilt, quiet.head_tilt);
    }

    #[test]
    fn speaking_mouth_stays_open() {
        for step in 0..100 {
            let mouth = speaking_mouth(step as f32 * 0.037);
            assert!((0.299..=0.501).contains(&mouth), "mouth {mouth}");
        }
    }

    #[test]
    fn breathing_moves_head_and_body_together() {
        let frame = next_frame(&PoseFrame::default(), 0.6, Mood::Neutral, false);
        let breath = (0.6f32 * 2.0).sin();
        assert_close(frame.head_y, 0.5 + breath * 0.02);
        assert_close(frame.body_scale_y, 1.0 + breath * 0.01);
    }

    #[test]
    fn external_model_sways_only_when_excited() {
        let calm = external_model_frame(0.4, Mood::Calm, false);
        assert_eq!(calm, ModelFrame { rotation_y: 0.0, offset_y: 0.0 });

        let excited = external_model_frame(0.4, Mood::Excited, true);
        assert_close(excited.rotation_y, (0.4f32 * 3.0).sin() * 0.1);
        assert_close(excited.offset_y, speaking_bob(0.4));
    }

    #[test]
    fn customization_round_trips_through_json() {
        let customization = AvatarCustomization {
            skin_tone: "#8d5524".into(),
            eye_color: "#50c878".into(),
            hair_style: HairStyle::Long,
            hair_color: "#b794f6".into(),
            clothing_color: "#48bb78".into(),
        };

        let json = serde_json::to_value(&customization).unwrap();
        assert_eq!(json["skinTone"], "#8d5524");
        assert_eq!(json["hairStyle"], "long");

        let back: AvatarCustomization = serde_json::from_value(json).unwrap();
        assert_eq!(back, customization);
    }

    #[test]
    fn rejects_non_hex_colors() {
        assert_eq!(AvatarCustomization::default().invalid_color(), None);

        let customization = AvatarCustomization {
            eye_color: "blue".into(),
            ..AvatarCustomization::default()
        };
        assert_eq!(customization.invalid_color(), Some("eyeColor"));
        assert!(!is_hex_color("#12345"));
        assert!(!is_hex_color("#12345g"));
    }

    #[test]
    fn model_url_selects_external_rendering() {
        let mut profile = AvatarProfile::default();
        assert_eq!(profile.render_source(), RenderSource::Procedural);

        profile.model_url = Some("https://models.example/avatar.glb".into());
        assert_eq!(profile.render_source(), RenderSource::External);
    }
}
