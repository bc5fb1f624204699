//! status document returned by the web control endpoint

use serde::{Deserialize, Serialize};

use crate::entity::bo::render_state_bo::{BehaviorFlag, RenderState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDto {
    // palette index of light slot 1..3
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub slideshow: bool,
    pub autostart: bool,
    pub baselight: bool,
    pub metaposts: bool,
    // minutes since midnight
    pub downbeat: u16,
    pub name: String,
}

impl From<&RenderState> for StatusDto {
    fn from(state: &RenderState) -> Self {
        StatusDto {
            red: state.colors[0].index(),
            green: state.colors[1].index(),
            blue: state.colors[2].index(),
            slideshow: state.flags.contains(BehaviorFlag::SlideshowMode),
            autostart: state.flags.contains(BehaviorFlag::AutoStart),
            baselight: state.flags.contains(BehaviorFlag::BaseLight),
            metaposts: state.flags.contains(BehaviorFlag::MetaPosts),
            downbeat: state.downbeat_minutes,
            name: state.venue_name.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_document() {
        let dto = StatusDto::from(&RenderState::default());
        let json = serde_json::to_string(&dto).unwrap();
        assert_eq!(
            json,
            "{\"red\":1,\"green\":2,\"blue\":3,\"slideshow\":false,\"autostart\":true,\
             \"baselight\":true,\"metaposts\":true,\"downbeat\":1200,\"name\":\"Your Venue Name Here\"}"
        );
    }

    #[test]
    fn test_name_is_escaped() {
        let dto = StatusDto::from(&RenderState::with_venue("Joe's \"Bar\""));
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["name"], "Joe's \"Bar\"");
    }
}
