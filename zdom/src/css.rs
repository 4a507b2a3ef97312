//! Just enough CSS to evaluate class rules written into `style` elements.

use std::fmt;

use log::trace;
use serde::Deserialize;

use crate::{Document, ElementId};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,

    /// Opacity in `0.0..=1.0`.
    pub a: f32,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Reads `rgb(r, g, b)` or `rgba(r, g, b, a)`.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (args, has_alpha) = if let Some(rest) = s.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = s.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return None;
        };
        let args = args.strip_suffix(')')?;
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return None;
        }
        let r = parts[0].parse().ok()?;
        let g = parts[1].parse().ok()?;
        let b = parts[2].parse().ok()?;
        let a = if has_alpha {
            parts[3].parse().ok()?
        } else {
            1.0
        };
        Some(Self { r, g, b, a })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// A rule with a single class selector: `.name{prop: value; ...}`.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub class: String,
    pub declarations: Vec<(String, String)>,
}

impl Rule {
    /// Reads every class rule in `text`. Anything else is skipped.
    pub fn parse_all(text: &str) -> Vec<Rule> {
        let mut rules = Vec::new();
        for chunk in text.split('}') {
            let (selector, body) = match chunk.split_once('{') {
                Some(pair) => pair,
                None => continue,
            };
            let class = match selector.trim().strip_prefix('.') {
                Some(class) if !class.is_empty() && !class.contains(char::is_whitespace) => class,
                _ => {
                    trace!("css: skipping selector '{}'", selector.trim());
                    continue;
                }
            };
            let declarations = body
                .split(';')
                .filter_map(|decl| decl.split_once(':'))
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .filter(|(name, _)| !name.is_empty())
                .collect();
            rules.push(Rule {
                class: class.to_string(),
                declarations,
            });
        }
        rules
    }

    /// The last value given to `name`.
    pub fn declaration(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.as_str())
    }
}

impl Document {
    /// The `background-color` of the last matching rule among all attached
    /// `style` elements.
    pub fn background_of(&self, el: ElementId) -> Option<Color> {
        let mut color = None;
        for style in self.get_elements_by_tag_name("style") {
            for rule in Rule::parse_all(self.text(style)) {
                if !self.has_class(el, &rule.class) {
                    continue;
                }
                if let Some(c) = rule.declaration("background-color").and_then(Color::parse) {
                    color = Some(c);
                }
            }
        }
        color
    }
}
