//! Style slots and theme properties
//!
//! Each [`StyleId`] slot holds a [`StyleProps`] parsed from a property value
//! such as `fore:#204a87,bold`. The built-in table can be overridden by a
//! [`ThemeStore`], a flat key/value source keyed `style.<language>.<id>`.
//!
//! Theme problems are never fatal: a malformed value is logged and skipped
//! and the slot keeps its previous settings.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::syntax::{StyleId, TokenKind, STYLE_COUNT};

/// Font face used when a style names none
pub const DEFAULT_FACE: &str = "Monospace";

/// Point size used when a style names none
pub const DEFAULT_SIZE: u32 = 12;

pub const DEFAULT_FORE: Color = Color::rgb(0x00, 0x00, 0x00);
pub const DEFAULT_BACK: Color = Color::rgb(0xff, 0xff, 0xff);

/// Built-in property values, indexed by style slot
pub const DEFAULT_STYLE_PROPS: [&str; STYLE_COUNT] = [
    "fore:#000000",                            // default
    "fore:#4e9a06",                            // comment
    "fore:#204a87,bold",                       // title
    "fore:#888a85",                            // transition
    "fore:#5c3566",                            // list
    "fore:#845902",                            // definition
    "fore:#a40000",                            // field name
    "fore:#3465a4,back:#eeeeec",               // option
    "fore:#3465a4,back:#eeeeec,face:Monospace", // literal block
    "fore:#8f5902",                            // line block
    "fore:#8f5902",                            // quote
    "fore:#3465a4,back:#eeeeec",               // doctest
    "fore:#ce5c00",                            // table
    "fore:#555753",                            // footnote
    "fore:#4e9a06",                            // target
    "fore:#a40000",                            // directive name
    "italic",                                  // emphasis
    "bold",                                    // strong
    "fore:#3465a4,back:#eeeeec,face:Monospace", // inline literal
    "fore:#4e9a06,underline",                  // url
    "fore:#4e9a06,underline",                  // link
    "fore:#555753",                            // footnote ref
    "fore:#4e9a06",                            // substitution
    "fore:#4e9a06",                            // target ref
    "fore:#4e9a06",                            // reference
    "back:#ef2929",                            // trailing space
];

/// RGB color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse from "#RRGGBB" (the leading '#' is optional)
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let hex = s.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("Invalid color format: {}", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("Invalid color '{}': {}", s, e))
        };
        Ok(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    /// Lowercase "#rrggbb"
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Resolved font description for a style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSpec {
    pub face: String,
    pub size: u32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

/// Properties of one style slot. Unset colors and fonts fall back to the
/// defaults at lookup time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleProps {
    pub fore: Option<Color>,
    pub back: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub face: Option<String>,
    pub size: Option<u32>,
}

impl StyleProps {
    /// Parse a comma separated directive list.
    ///
    /// Accepts `fore:#RRGGBB`, `back:#RRGGBB`, `bold`, `italic`, `underline`,
    /// `face:<font>` (or `font:<font>`), `size:<points>` and the legacy
    /// `$(font.<name>)` form. Empty items are ignored; anything else rejects
    /// the whole value.
    pub fn parse(value: &str) -> Result<Self, String> {
        let mut props = StyleProps::default();

        for item in value.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            match item {
                "bold" => props.bold = true,
                "italic" => props.italic = true,
                "underline" => props.underline = true,
                _ => {
                    if let Some(font) = item
                        .strip_prefix("$(font.")
                        .and_then(|rest| rest.strip_suffix(')'))
                    {
                        props.face = Some(non_empty(font, item)?.to_string());
                        continue;
                    }

                    let (key, arg) = item
                        .split_once(':')
                        .ok_or_else(|| format!("Unknown style directive: {}", item))?;
                    let arg = arg.trim();
                    match key.trim() {
                        "fore" => props.fore = Some(parse_color(arg)?),
                        "back" => props.back = Some(parse_color(arg)?),
                        "face" | "font" => props.face = Some(non_empty(arg, item)?.to_string()),
                        "size" => {
                            let size = arg
                                .parse::<u32>()
                                .map_err(|e| format!("Invalid font size '{}': {}", arg, e))?;
                            props.size = Some(size);
                        }
                        other => return Err(format!("Unknown style directive: {}", other)),
                    }
                }
            }
        }

        Ok(props)
    }
}

fn parse_color(arg: &str) -> Result<Color, String> {
    if !arg.starts_with('#') {
        return Err(format!("Color must start with '#': {}", arg));
    }
    Color::from_hex(arg)
}

fn non_empty<'a>(value: &'a str, item: &str) -> Result<&'a str, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("Missing font name in '{}'", item))
    } else {
        Ok(value)
    }
}

impl FromStr for StyleProps {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleProps::parse(s)
    }
}

impl fmt::Display for StyleProps {
    /// Property string in the same directive grammar `parse` accepts
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(fore) = self.fore {
            parts.push(format!("fore:{}", fore));
        }
        if let Some(back) = self.back {
            parts.push(format!("back:{}", back));
        }
        if self.bold {
            parts.push("bold".to_string());
        }
        if self.italic {
            parts.push("italic".to_string());
        }
        if self.underline {
            parts.push("underline".to_string());
        }
        if let Some(face) = &self.face {
            parts.push(format!("face:{}", face));
        }
        if let Some(size) = self.size {
            parts.push(format!("size:{}", size));
        }
        f.write_str(&parts.join(","))
    }
}

/// External key/value property source
pub trait ThemeStore {
    fn property(&self, key: &str) -> Option<String>;
}

impl ThemeStore for HashMap<String, String> {
    fn property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ThemeStore for BTreeMap<String, String> {
    fn property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Flat YAML mapping of property keys to values
///
/// ```yaml
/// style.rst.2: fore:#000080,bold
/// style.rst.16: italic,fore:#444444
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyFile {
    properties: BTreeMap<String, String>,
}

impl PropertyFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML mapping. Scalar values are kept as text, other values
    /// are skipped with a warning.
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        let raw: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))?;

        let mut properties = BTreeMap::new();
        for (key, value) in raw {
            let text = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Null => String::new(),
                _ => {
                    tracing::warn!("Ignoring non-scalar theme property '{}'", key);
                    continue;
                }
            };
            properties.insert(key, text);
        }
        Ok(Self { properties })
    }

    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read theme file {}: {}", path.display(), e))?;
        Self::from_yaml(&content)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl ThemeStore for PropertyFile {
    fn property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }
}

/// Style properties for every slot of one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTable {
    language: String,
    slots: Vec<StyleProps>,
}

impl StyleTable {
    /// Table initialised from [`DEFAULT_STYLE_PROPS`]
    pub fn new(language: impl Into<String>) -> Self {
        let slots = DEFAULT_STYLE_PROPS
            .iter()
            .enumerate()
            .map(|(id, value)| {
                StyleProps::parse(value).unwrap_or_else(|e| {
                    tracing::error!("Built-in style {} is malformed: {}", id, e);
                    StyleProps::default()
                })
            })
            .collect();
        Self {
            language: language.into(),
            slots,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Property key addressing a slot, e.g. `style.rst.2`
    pub fn key(&self, id: StyleId) -> String {
        format!("style.{}.{}", self.language, id.0)
    }

    /// Properties of a slot; unknown slots get the default style
    pub fn style(&self, id: StyleId) -> &StyleProps {
        self.slots
            .get(id.index())
            .or_else(|| self.slots.get(StyleId::DEFAULT.index()))
            .unwrap_or(&FALLBACK_PROPS)
    }

    /// Properties for a raw slot number, as held by hosts
    pub fn style_for_id(&self, id: u8) -> &StyleProps {
        self.style(StyleId(id))
    }

    pub fn style_for(&self, kind: TokenKind) -> &StyleProps {
        self.style(kind.style_id())
    }

    pub fn set(&mut self, id: StyleId, props: StyleProps) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(slot) => {
                *slot = props;
                true
            }
            None => false,
        }
    }

    pub fn default_color(&self, kind: TokenKind) -> Color {
        self.style_for(kind).fore.unwrap_or(DEFAULT_FORE)
    }

    pub fn default_paper(&self, kind: TokenKind) -> Color {
        self.style_for(kind).back.unwrap_or(DEFAULT_BACK)
    }

    pub fn default_font(&self, kind: TokenKind) -> FontSpec {
        let props = self.style_for(kind);
        FontSpec {
            face: props
                .face
                .clone()
                .unwrap_or_else(|| DEFAULT_FACE.to_string()),
            size: props.size.unwrap_or(DEFAULT_SIZE),
            bold: props.bold,
            italic: props.italic,
            underline: props.underline,
        }
    }

    /// Re-read every slot from `store`. A present, well-formed value replaces
    /// the slot wholesale; a malformed one is rejected and the slot kept.
    /// Returns the number of slots updated.
    pub fn reload(&mut self, store: &dyn ThemeStore) -> usize {
        let mut updated = 0;
        for id in StyleId::all() {
            let key = self.key(id);
            let Some(value) = store.property(&key) else {
                continue;
            };
            match StyleProps::parse(&value) {
                Ok(props) => {
                    if self.set(id, props) {
                        updated += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("Rejected theme entry {} = '{}': {}", key, value, e);
                }
            }
        }
        tracing::debug!("Reloaded {} style slots for '{}'", updated, self.language);
        updated
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleId, &StyleProps)> {
        StyleId::all().zip(self.slots.iter())
    }
}

static FALLBACK_PROPS: StyleProps = StyleProps {
    fore: None,
    back: None,
    bold: false,
    italic: false,
    underline: false,
    face: None,
    size: None,
};
