// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 各招聘网站的抓取器实现
///
/// 每个抓取器只依赖 [`PageFetcher`](crate::engines::traits::PageFetcher)，
/// 页面解析部分是纯函数，可以直接用固定 HTML 测试。
pub mod common;
pub mod dice;
pub mod extract;
pub mod indeed;
pub mod linkedin;
pub mod registry;
pub mod wellfound;
pub mod ycombinator;

pub use dice::DiceScraper;
pub use indeed::IndeedScraper;
pub use linkedin::LinkedInScraper;
pub use registry::ScraperRegistry;
pub use wellfound::WellfoundScraper;
pub use ycombinator::YCombinatorScraper;
