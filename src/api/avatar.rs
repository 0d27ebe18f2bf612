//! Avatar profile and animation endpoints

use crate::api::{ExtractUser, JsonBody};
use crate::core::avatar::{self, AvatarProfile, MoodPose};
use crate::core::error::CompanionError;
use crate::core::mood::Mood;
use crate::core::traits::AvatarService;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_profile).put(save_profile))
        .route("/pose", post(pose))
}

async fn get_profile(
    Inject(avatar_service): Inject<dyn AvatarService>,
    ExtractUser(current_user): ExtractUser,
) -> Result<Json<schemas::Profile>, CompanionError> {
    let profile = avatar_service.profile(current_user).await?;

    Ok(Json(profile.into()))
}

async fn save_profile(
    Inject(avatar_service): Inject<dyn AvatarService>,
    ExtractUser(current_user): ExtractUser,
    JsonBody(profile): JsonBody<AvatarProfile>,
) -> Result<Json<schemas::Profile>, CompanionError> {
    let saved = avatar_service.save_profile(current_user, profile).await?;

    Ok(Json(saved.into()))
}

/// Advances the avatar by one frame. Stateless, so no user is required.
async fn pose(
    JsonBody(request): JsonBody<schemas::PoseRequest>,
) -> Json<schemas::PoseResponse> {
    let mood = Mood::from_label(&request.mood);
    let previous = request.previous.unwrap_or_default();

    Json(schemas::PoseResponse {
        mood,
        target: MoodPose::for_mood(mood),
        frame: avatar::next_frame(&previous, request.elapsed, mood, request.speaking),
        model_frame: avatar::external_model_frame(request.elapsed, mood, request.speaking),
    })
}

pub mod schemas {
    use crate::core::avatar::{
        AvatarCustomization, AvatarProfile, ModelFrame, MoodPose, PoseFrame, RenderSource,
    };
    use crate::core::mood::Mood;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Debug)]
    pub struct Profile {
        pub customization: AvatarCustomization,
        pub model_url: Option<String>,
        pub render_source: RenderSource,
    }

    impl From<AvatarProfile> for Profile {
        fn from(profile: AvatarProfile) -> Self {
            let render_source = profile.render_source();
            Profile {
                customization: profile.customization,
                model_url: profile.model_url,
                render_source,
            }
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct PoseRequest {
        /// Free-form label, unknown labels fall back to neutral.
        #[serde(default)]
        pub mood: String,
        #[serde(default)]
        pub speaking: bool,
        /// Seconds since the avatar was mounted.
        pub elapsed: f32,
        pub previous: Option<PoseFrame>,
    }

    #[derive(Serialize, Debug)]
    pub struct PoseResponse {
        pub mood: Mood,
        pub target: MoodPose,
        pub frame: PoseFrame,
        pub model_frame: ModelFrame,
    }
}
