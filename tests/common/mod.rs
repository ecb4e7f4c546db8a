//! Shared fixtures for integration tests: a seeded generator and synthetic
//! life data.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::sync::Arc;

use life_connections::adapters::{InMemoryConnectionStore, InMemoryDomainDataSource};
use life_connections::application::{
    AnalyzeConnectionsCommand, AnalyzeConnectionsConfig, AnalyzeConnectionsHandler,
};
use life_connections::domain::connections::{AnalysisOptions, MetricObservations, ValueType};
use life_connections::domain::foundation::{DomainId, UserId};

/// xorshift64; deterministic across platforms.
pub struct SeededRng(u64);

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed })
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    pub fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = (self.next_u64() % (i as u64 + 1)) as usize;
            items.swap(i, j);
        }
    }
}

pub const DAYS: usize = 35;

/// Last day of every synthetic window (a Sunday, so the window starts on a
/// Monday).
pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 9).unwrap()
}

pub fn first_day() -> NaiveDate {
    as_of() - Duration::days(DAYS as i64 - 1)
}

pub fn day(i: usize) -> NaiveDate {
    first_day() + Duration::days(i as i64)
}

pub fn user() -> UserId {
    UserId::new("user-1").unwrap()
}

pub fn metric(domain: &str, name: &str, value_type: ValueType, values: &[f64]) -> MetricObservations {
    values.iter().enumerate().fold(
        MetricObservations::new(DomainId::new(domain).unwrap(), name, value_type),
        |m, (i, v)| m.with_observation(day(i), *v),
    )
}

/// 17 badminton days with 7.5-8.5h sleep, 5.5-6.5h otherwise, 0-3 photos a
/// day and steps that depend on nothing.
pub fn life_scenario(seed: u64) -> Vec<MetricObservations> {
    let mut rng = SeededRng::new(seed);
    let mut order: Vec<usize> = (0..DAYS).collect();
    rng.shuffle(&mut order);
    let badminton_days = &order[..17];

    let mut flags = Vec::with_capacity(DAYS);
    let mut sleep = Vec::with_capacity(DAYS);
    let mut photos = Vec::with_capacity(DAYS);
    let mut steps = Vec::with_capacity(DAYS);
    for i in 0..DAYS {
        let played = badminton_days.contains(&i);
        flags.push(if played { 1.0 } else { 0.0 });
        sleep.push(if played { 7.5 } else { 5.5 } + rng.next_f64());
        photos.push(rng.below(4) as f64);
        steps.push(rng.uniform(4_000.0, 12_000.0));
    }

    vec![
        metric("badminton", "played", ValueType::Binary, &flags),
        metric("sleep", "hours", ValueType::Continuous, &sleep).with_unit("h"),
        metric("photos", "taken", ValueType::Count, &photos),
        metric("steps", "count", ValueType::Continuous, &steps),
    ]
}

pub fn command(options: AnalysisOptions) -> AnalyzeConnectionsCommand {
    AnalyzeConnectionsCommand {
        user_id: user(),
        options,
        as_of: Some(as_of()),
    }
}

pub struct Harness {
    pub data_source: Arc<InMemoryDomainDataSource>,
    pub store: Arc<InMemoryConnectionStore>,
    pub handler: AnalyzeConnectionsHandler,
}

pub fn harness(metrics: Vec<MetricObservations>) -> Harness {
    harness_with(
        InMemoryDomainDataSource::new().with_metrics(&user(), metrics),
        AnalyzeConnectionsConfig::default(),
    )
}

pub fn harness_with(
    data_source: InMemoryDomainDataSource,
    config: AnalyzeConnectionsConfig,
) -> Harness {
    let data_source = Arc::new(data_source);
    let store = Arc::new(InMemoryConnectionStore::new());
    let handler = AnalyzeConnectionsHandler::new(data_source.clone(), store.clone(), config);
    Harness {
        data_source,
        store,
        handler,
    }
}
