//! # Move catalog: dances, basic motions, expressions.
//!
//! [`MotionLibrary`] holds what the robot can physically do: dance moves
//! and basic motions with their natural durations, and facial expressions
//! tagged with the emotion they suit. The planner selects from it by
//! best-fit against segment spans and gaps.
//!
//! A motion pool can also be loaded from a plain `name duration_ms` text
//! listing (one move per line) via [`MotionLibrary::parse_action_pool`].

use std::io::{self, BufRead};
use std::time::Duration;

/// A dance move or basic motion with its natural duration.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionDef {
    /// Command name understood by the gateway.
    pub name: String,
    /// How long the move takes when played to completion.
    pub duration: Duration,
}

impl MotionDef {
    /// Creates a motion definition.
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

/// A facial expression tagged with the emotion it suits.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionDef {
    /// Command name understood by the gateway.
    pub name: String,
    /// Emotion label this expression matches.
    pub emotion: String,
}

impl ExpressionDef {
    /// Creates an expression definition.
    pub fn new(name: impl Into<String>, emotion: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emotion: emotion.into(),
        }
    }
}

/// Catalog of the robot's moves and expressions.
#[derive(Clone, Debug)]
pub struct MotionLibrary {
    dances: Vec<MotionDef>,
    basics: Vec<MotionDef>,
    expressions: Vec<ExpressionDef>,
}

impl Default for MotionLibrary {
    /// Built-in catalog covering the stock move set.
    fn default() -> Self {
        Self {
            dances: vec![
                MotionDef::new("swing_step", Duration::from_millis(4500)),
                MotionDef::new("stomp_beat", Duration::from_secs(5)),
                MotionDef::new("spin_groove", Duration::from_secs(6)),
                MotionDef::new("wave_dance", Duration::from_secs(8)),
                MotionDef::new("robot_pop", Duration::from_secs(10)),
                MotionDef::new("slow_sway", Duration::from_secs(12)),
            ],
            basics: vec![
                MotionDef::new("shrug", Duration::from_millis(1500)),
                MotionDef::new("nod", Duration::from_secs(2)),
                MotionDef::new("look_around", Duration::from_millis(2500)),
                MotionDef::new("stretch", Duration::from_secs(3)),
            ],
            expressions: vec![
                ExpressionDef::new("smile", "happy"),
                ExpressionDef::new("laugh", "happy"),
                ExpressionDef::new("wink", "energetic"),
                ExpressionDef::new("surprise", "energetic"),
                ExpressionDef::new("calm_blink", "calm"),
                ExpressionDef::new("dreamy", "calm"),
                ExpressionDef::new("fierce", "powerful"),
                ExpressionDef::new("proud", "powerful"),
            ],
        }
    }
}

impl MotionLibrary {
    /// Creates a library from explicit catalogs.
    pub fn new(
        dances: Vec<MotionDef>,
        basics: Vec<MotionDef>,
        expressions: Vec<ExpressionDef>,
    ) -> Self {
        Self {
            dances,
            basics,
            expressions,
        }
    }

    /// Parses a `name duration_ms` listing, one move per line.
    ///
    /// Blank lines and `#` comments are skipped. Malformed lines produce an
    /// `InvalidData` error naming the line number.
    pub fn parse_action_pool<R: BufRead>(reader: R) -> io::Result<Vec<MotionDef>> {
        let mut pool = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.split_whitespace();
            let entry = parts
                .next()
                .zip(parts.next())
                .and_then(|(name, millis)| {
                    millis
                        .parse::<u64>()
                        .ok()
                        .map(|ms| MotionDef::new(name, Duration::from_millis(ms)))
                });
            match entry {
                Some(def) => pool.push(def),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("line {}: expected `name duration_ms`, got {line:?}", lineno + 1),
                    ));
                }
            }
        }
        Ok(pool)
    }

    /// Replaces the dance catalog.
    pub fn with_dances(mut self, dances: Vec<MotionDef>) -> Self {
        self.dances = dances;
        self
    }

    /// Replaces the basic-motion catalog.
    pub fn with_basics(mut self, basics: Vec<MotionDef>) -> Self {
        self.basics = basics;
        self
    }

    /// Replaces the expression catalog.
    pub fn with_expressions(mut self, expressions: Vec<ExpressionDef>) -> Self {
        self.expressions = expressions;
        self
    }

    /// Dance moves.
    pub fn dances(&self) -> &[MotionDef] {
        &self.dances
    }

    /// Basic motions.
    pub fn basics(&self) -> &[MotionDef] {
        &self.basics
    }

    /// Expressions.
    pub fn expressions(&self) -> &[ExpressionDef] {
        &self.expressions
    }

    /// The dance whose natural duration best fits `span` (closest, either
    /// side). Ties go to the shorter move.
    pub fn best_dance(&self, span: Duration) -> Option<&MotionDef> {
        self.dances.iter().min_by_key(|d| {
            let diff = if d.duration > span {
                d.duration - span
            } else {
                span - d.duration
            };
            (diff, d.duration)
        })
    }

    /// Basic motions that fit inside `gap`, unordered.
    pub fn basics_fitting(&self, gap: Duration) -> Vec<&MotionDef> {
        self.basics.iter().filter(|d| d.duration <= gap).collect()
    }

    /// Expressions matching `emotion`; unknown labels fall back to the full
    /// catalog.
    pub fn expressions_for(&self, emotion: &str) -> Vec<&ExpressionDef> {
        let matching: Vec<&ExpressionDef> = self
            .expressions
            .iter()
            .filter(|e| e.emotion == emotion)
            .collect();
        if matching.is_empty() {
            self.expressions.iter().collect()
        } else {
            matching
        }
    }
}
