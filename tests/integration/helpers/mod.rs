// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod fake_fetcher;
pub mod stub_scraper;

pub use fake_fetcher::{FakeFetcher, FakeResponse};
pub use stub_scraper::StubScraper;
