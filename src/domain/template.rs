//! Version name templates
//!
//! A template such as `{PROJECT}.W{WEEK}.{YEAR}.{MONTH}.{DAY}` is compiled
//! once into literal and placeholder tokens. The same tokens drive both
//! directions: [`VersionTemplate::render`] fills them from [`VersionFields`],
//! and [`VersionTemplate::parse`] builds an anchored regex from them to
//! recover the fields from an existing version name.
//!
//! Placeholders are `{NAME}` or `{NAME:W}` with `W` a zero-pad width. Unknown
//! placeholders stay in the output as literal text.

use crate::domain::calendar::iso_week;
use crate::domain::prerelease::PreRelease;
use crate::domain::version::SemanticVersion;
use crate::error::{Result, VersionManagerError};
use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fmt;

/// Id of the template every configuration must define.
pub const STANDARD_TEMPLATE: &str = "standard";

/// Placeholders recognised inside a template pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Project,
    Week,
    Year,
    Month,
    Day,
    Major,
    Minor,
    Patch,
    PreRelease,
    Build,
    Metadata,
}

impl Placeholder {
    pub const ALL: [Placeholder; 11] = [
        Placeholder::Project,
        Placeholder::Week,
        Placeholder::Year,
        Placeholder::Month,
        Placeholder::Day,
        Placeholder::Major,
        Placeholder::Minor,
        Placeholder::Patch,
        Placeholder::PreRelease,
        Placeholder::Build,
        Placeholder::Metadata,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Project => "PROJECT",
            Placeholder::Week => "WEEK",
            Placeholder::Year => "YEAR",
            Placeholder::Month => "MONTH",
            Placeholder::Day => "DAY",
            Placeholder::Major => "MAJOR",
            Placeholder::Minor => "MINOR",
            Placeholder::Patch => "PATCH",
            Placeholder::PreRelease => "PRE_RELEASE",
            Placeholder::Build => "BUILD",
            Placeholder::Metadata => "METADATA",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Placeholder::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Zero-pad width applied when the pattern does not declare one.
    pub fn default_width(self) -> Option<usize> {
        match self {
            Placeholder::Week | Placeholder::Month | Placeholder::Day => Some(2),
            _ => None,
        }
    }

    /// Plain numeric placeholders: the only ones accepting a width.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Placeholder::Week
                | Placeholder::Year
                | Placeholder::Month
                | Placeholder::Day
                | Placeholder::Major
                | Placeholder::Minor
                | Placeholder::Patch
        )
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Field {
        placeholder: Placeholder,
        width: Option<usize>,
    },
}

/// Structured values a version name is rendered from or parsed into.
///
/// Only the fields referenced by a template take part in rendering; parsing
/// fills exactly the fields the template references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFields {
    pub project: Option<String>,
    pub week: Option<u32>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub major: Option<u64>,
    pub minor: Option<u64>,
    pub patch: Option<u64>,
    pub pre_release: Option<PreRelease>,
    pub build: Option<u64>,
    pub metadata: Option<String>,
}

impl VersionFields {
    /// Project plus the date fields (ISO week, calendar year/month/day) of `date`.
    pub fn for_date(project: impl Into<String>, date: NaiveDate) -> Self {
        let (_, week) = iso_week(date);
        VersionFields {
            project: Some(project.into()),
            week: Some(week),
            year: Some(date.year()),
            month: Some(date.month()),
            day: Some(date.day()),
            ..VersionFields::default()
        }
    }

    /// Copies every semantic part of `version` into these fields.
    pub fn with_version(mut self, version: &SemanticVersion) -> Self {
        self.major = Some(version.major);
        self.minor = Some(version.minor);
        self.patch = Some(version.patch);
        self.pre_release = version.pre_release.clone();
        self.build = version.build;
        self.metadata = version.metadata.clone();
        self
    }

    /// Calendar date from year/month/day, if all present and valid.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }

    /// Semantic version, if major/minor/patch are all present.
    pub fn semantic_version(&self) -> Option<SemanticVersion> {
        Some(SemanticVersion {
            major: self.major?,
            minor: self.minor?,
            patch: self.patch?,
            pre_release: self.pre_release.clone(),
            build: self.build,
            metadata: self.metadata.clone(),
        })
    }

    /// Same fields with the week number recomputed from the date.
    pub fn normalized(&self) -> Self {
        let mut fields = self.clone();
        if let (Some(date), Some(_)) = (self.date(), self.week) {
            fields.week = Some(iso_week(date).1);
        }
        fields
    }
}

/// A compiled version name template
#[derive(Debug, Clone)]
pub struct VersionTemplate {
    id: String,
    pattern: String,
    tokens: Vec<Token>,
    strict: Regex,
    lenient: Regex,
}

impl VersionTemplate {
    /// Compile `pattern` under the id `id`.
    ///
    /// # Returns
    /// * `Ok(VersionTemplate)` - Compiled template
    /// * `Err` - Empty pattern, or a width on a non-numeric placeholder, or a
    ///   width that is not a number
    pub fn compile(id: impl Into<String>, pattern: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let pattern = pattern.into();
        let tokens = tokenize(&id, &pattern)?;
        let strict = build_matcher(&id, &tokens, false)?;
        let lenient = build_matcher(&id, &tokens, true)?;

        Ok(VersionTemplate {
            id,
            pattern,
            tokens,
            strict,
            lenient,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern contains `placeholder`.
    pub fn references(&self, placeholder: Placeholder) -> bool {
        self.tokens.iter().any(|token| {
            matches!(token, Token::Field { placeholder: p, .. } if *p == placeholder)
        })
    }

    /// Whether names from this template carry a full calendar date.
    pub fn is_dated(&self) -> bool {
        self.references(Placeholder::Year)
            && self.references(Placeholder::Month)
            && self.references(Placeholder::Day)
    }

    /// Whether this template needs a semantic version to render.
    pub fn is_semantic(&self) -> bool {
        self.references(Placeholder::Major)
            || self.references(Placeholder::Minor)
            || self.references(Placeholder::Patch)
    }

    /// Render a version name from `fields`.
    ///
    /// Optional parts (`{PRE_RELEASE}`, `{BUILD}`, `{METADATA}`) render as
    /// empty text when absent; any other missing value is an error.
    pub fn render(&self, fields: &VersionFields) -> Result<String> {
        let mut name = String::new();

        for token in &self.tokens {
            let (placeholder, width) = match token {
                Token::Literal(text) => {
                    name.push_str(text);
                    continue;
                }
                Token::Field { placeholder, width } => (*placeholder, width.unwrap_or(0)),
            };

            match placeholder {
                Placeholder::Project => {
                    name.push_str(self.require(fields.project.as_deref(), placeholder)?)
                }
                Placeholder::Week => {
                    name.push_str(&padded(self.require(fields.week, placeholder)?, width))
                }
                Placeholder::Year => {
                    name.push_str(&padded(self.require(fields.year, placeholder)?, width))
                }
                Placeholder::Month => {
                    name.push_str(&padded(self.require(fields.month, placeholder)?, width))
                }
                Placeholder::Day => {
                    name.push_str(&padded(self.require(fields.day, placeholder)?, width))
                }
                Placeholder::Major => {
                    name.push_str(&padded(self.require(fields.major, placeholder)?, width))
                }
                Placeholder::Minor => {
                    name.push_str(&padded(self.require(fields.minor, placeholder)?, width))
                }
                Placeholder::Patch => {
                    name.push_str(&padded(self.require(fields.patch, placeholder)?, width))
                }
                Placeholder::PreRelease => {
                    if let Some(pre) = &fields.pre_release {
                        name.push('-');
                        name.push_str(&pre.to_string());
                    }
                }
                Placeholder::Build => {
                    if let Some(build) = fields.build {
                        name.push_str(&format!("+b{}", build));
                    }
                }
                Placeholder::Metadata => {
                    if let Some(metadata) = &fields.metadata {
                        name.push_str(metadata);
                    }
                }
            }
        }

        Ok(name)
    }

    /// Recover the fields of `name` if it conforms to this template.
    ///
    /// Padded numeric fields must have exactly their declared width. A name
    /// that does not conform is simply `None`.
    pub fn parse(&self, name: &str) -> Option<VersionFields> {
        self.strict
            .captures(name)
            .and_then(|caps| self.extract(&caps))
    }

    /// Like [`parse`](Self::parse) but accepts numeric fields of any width,
    /// for spotting names that were meant for this template but mis-padded.
    pub fn parse_lenient(&self, name: &str) -> Option<VersionFields> {
        self.lenient
            .captures(name)
            .and_then(|caps| self.extract(&caps))
    }

    fn require<T>(&self, value: Option<T>, placeholder: Placeholder) -> Result<T> {
        value.ok_or_else(|| {
            VersionManagerError::template(format!(
                "template '{}' needs a value for {}",
                self.id, placeholder
            ))
        })
    }

    fn extract(&self, caps: &Captures<'_>) -> Option<VersionFields> {
        let mut fields = VersionFields::default();

        for (index, token) in self.tokens.iter().enumerate() {
            let Token::Field { placeholder, .. } = token else {
                continue;
            };
            let group = group_name(index);
            let text = caps.name(&group).map(|m| m.as_str());

            match placeholder {
                Placeholder::Project => {
                    merge(&mut fields.project, text.map(str::to_string))?
                }
                Placeholder::Week => merge(&mut fields.week, number(text)?)?,
                Placeholder::Year => merge(&mut fields.year, number(text)?)?,
                Placeholder::Month => merge(&mut fields.month, number(text)?)?,
                Placeholder::Day => merge(&mut fields.day, number(text)?)?,
                Placeholder::Major => merge(&mut fields.major, number(text)?)?,
                Placeholder::Minor => merge(&mut fields.minor, number(text)?)?,
                Placeholder::Patch => merge(&mut fields.patch, number(text)?)?,
                Placeholder::Build => merge(&mut fields.build, number(text)?)?,
                Placeholder::PreRelease => {
                    let label = caps.name(&format!("{}l", group));
                    let counter = caps.name(&format!("{}n", group));
                    let pre = match (label, counter) {
                        (Some(label), Some(counter)) => Some(PreRelease {
                            label: label.as_str().to_string(),
                            counter: counter.as_str().parse().ok()?,
                        }),
                        _ => None,
                    };
                    merge(&mut fields.pre_release, pre)?
                }
                Placeholder::Metadata => {
                    let metadata = text.filter(|m| !m.is_empty()).map(str::to_string);
                    merge(&mut fields.metadata, metadata)?
                }
            }
        }

        Some(fields)
    }
}

impl fmt::Display for VersionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = \"{}\"", self.id, self.pattern)
    }
}

fn padded(value: impl fmt::Display, width: usize) -> String {
    format!("{:0>width$}", value.to_string(), width = width)
}

fn group_name(index: usize) -> String {
    format!("f{}", index)
}

/// Parses an optional numeric capture. The outer `None` means the capture
/// was present but unparsable (overflow), which rejects the whole match.
fn number<T: std::str::FromStr>(text: Option<&str>) -> Option<Option<T>> {
    match text {
        Some(text) => text.parse().ok().map(Some),
        None => Some(None),
    }
}

/// A placeholder used twice must capture the same value both times.
fn merge<T: PartialEq>(slot: &mut Option<T>, value: Option<T>) -> Option<()> {
    match (slot.as_ref(), value) {
        (_, None) => Some(()),
        (None, Some(value)) => {
            *slot = Some(value);
            Some(())
        }
        (Some(existing), Some(value)) => (*existing == value).then_some(()),
    }
}

fn tokenize(id: &str, pattern: &str) -> Result<Vec<Token>> {
    if pattern.is_empty() {
        return Err(VersionManagerError::config(format!(
            "template '{}' has an empty pattern",
            id
        )));
    }

    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = pattern;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find('}') else {
            // unterminated: the remainder is literal text
            literal.push_str(&rest[open..]);
            rest = "";
            break;
        };

        let inner = &after[..close];
        if inner.contains('{') {
            literal.push('{');
            rest = after;
            continue;
        }

        match parse_placeholder(id, inner)? {
            Some(field) => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                tokens.push(field);
            }
            None => literal.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

fn parse_placeholder(id: &str, inner: &str) -> Result<Option<Token>> {
    let (name, width) = match inner.split_once(':') {
        Some((name, width)) => (name, Some(width)),
        None => (inner, None),
    };
    let Some(placeholder) = Placeholder::from_name(name) else {
        return Ok(None);
    };

    let width = match width {
        None => placeholder.default_width(),
        Some(spec) => {
            if !placeholder.is_numeric() {
                return Err(VersionManagerError::config(format!(
                    "template '{}': {} does not accept a width",
                    id, placeholder
                )));
            }
            let width = spec.parse::<usize>().map_err(|_| {
                VersionManagerError::config(format!(
                    "template '{}': invalid width '{}' for {}",
                    id, spec, placeholder
                ))
            })?;
            (width > 0).then_some(width)
        }
    };

    Ok(Some(Token::Field { placeholder, width }))
}

fn build_matcher(id: &str, tokens: &[Token], lenient: bool) -> Result<Regex> {
    let mut expr = String::from("^");

    for (index, token) in tokens.iter().enumerate() {
        let (placeholder, width) = match token {
            Token::Literal(text) => {
                expr.push_str(&regex::escape(text));
                continue;
            }
            Token::Field { placeholder, width } => (*placeholder, *width),
        };
        let group = group_name(index);

        let capture = match placeholder {
            Placeholder::Project => format!("(?P<{}>[A-Z][A-Z0-9_]*)", group),
            Placeholder::PreRelease => format!(
                r"(?:-(?P<{g}l>[0-9A-Za-z-]+)\.(?P<{g}n>\d+))?",
                g = group
            ),
            Placeholder::Build => format!(r"(?:\+b(?P<{}>\d+))?", group),
            Placeholder::Metadata => format!("(?P<{}>.*?)", group),
            _ => match width {
                Some(width) if !lenient => format!(r"(?P<{}>\d{{{}}})", group, width),
                _ => format!(r"(?P<{}>\d+)", group),
            },
        };
        expr.push_str(&capture);
    }
    expr.push('$');

    Regex::new(&expr).map_err(|e| {
        VersionManagerError::config(format!("template '{}' cannot be matched: {}", id, e))
    })
}

/// Result of scanning a tracker-reported name against a template set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
    /// Id of the first template the name matched
    pub template_id: String,
    /// Fields recovered from the name
    pub fields: VersionFields,
    /// The name this template would render for those fields
    pub canonical: Option<String>,
    /// Matched with exact pad widths rather than leniently
    pub strict: bool,
}

impl ScanMatch {
    /// True when the name differs from its canonical rendering.
    pub fn needs_fix(&self, name: &str) -> bool {
        self.canonical
            .as_deref()
            .is_some_and(|canonical| canonical != name)
    }
}

/// Ordered templates active for one project
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: Vec<VersionTemplate>,
}

impl TemplateSet {
    pub fn iter(&self) -> impl Iterator<Item = &VersionTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.id().to_string()).collect()
    }

    /// Find which template `name` was generated from.
    ///
    /// Templates are tried in order with exact widths first, then leniently;
    /// the first match wins.
    pub fn scan(&self, name: &str) -> Option<ScanMatch> {
        let strict = self
            .templates
            .iter()
            .find_map(|template| template.parse(name).map(|fields| (template, fields, true)));

        let (template, fields, strict) = strict.or_else(|| {
            self.templates.iter().find_map(|template| {
                template
                    .parse_lenient(name)
                    .map(|fields| (template, fields, false))
            })
        })?;

        let canonical = template.render(&fields.normalized()).ok();
        Some(ScanMatch {
            template_id: template.id().to_string(),
            fields,
            canonical,
            strict,
        })
    }
}

/// Every configured template, compiled once
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, VersionTemplate>,
}

impl TemplateRegistry {
    /// Compile every pattern; `standard` must be among them.
    pub fn compile(patterns: &BTreeMap<String, String>) -> Result<Self> {
        if !patterns.contains_key(STANDARD_TEMPLATE) {
            return Err(VersionManagerError::config(format!(
                "template '{}' must be defined",
                STANDARD_TEMPLATE
            )));
        }

        let templates = patterns
            .iter()
            .map(|(id, pattern)| Ok((id.clone(), VersionTemplate::compile(id, pattern)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(TemplateRegistry { templates })
    }

    pub fn get(&self, id: &str) -> Option<&VersionTemplate> {
        self.templates.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// The templates named by `ids`, in that order. An empty list selects
    /// `standard`.
    pub fn select(&self, ids: &[String]) -> Result<TemplateSet> {
        if ids.is_empty() {
            return self.select(&[STANDARD_TEMPLATE.to_string()]);
        }

        let templates = ids
            .iter()
            .map(|id| {
                self.get(id).cloned().ok_or_else(|| {
                    VersionManagerError::config(format!("unknown template '{}'", id))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TemplateSet { templates })
    }
}
