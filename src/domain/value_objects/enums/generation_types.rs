use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const IMAGE_ENHANCE_CREDIT_COST: i32 = 1;
pub const VIDEO_GENERATE_CREDIT_COST: i32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GenerationType {
    ImageEnhance,
    VideoGenerate,
}

impl GenerationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationType::ImageEnhance => "image_enhance",
            GenerationType::VideoGenerate => "video_generate",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "image_enhance" => Some(GenerationType::ImageEnhance),
            "video_generate" => Some(GenerationType::VideoGenerate),
            _ => None,
        }
    }

    pub fn credit_cost(&self) -> i32 {
        match self {
            GenerationType::ImageEnhance => IMAGE_ENHANCE_CREDIT_COST,
            GenerationType::VideoGenerate => VIDEO_GENERATE_CREDIT_COST,
        }
    }
}

impl Display for GenerationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
