// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::LocationType;

/// 根据地点文本推断地点类型
pub fn classify_location(text: &str) -> LocationType {
    let lower = text.to_lowercase();
    if lower.contains("remote") {
        LocationType::Remote
    } else if lower.contains("hybrid") {
        LocationType::Hybrid
    } else {
        LocationType::Onsite
    }
}
