//! Batch rename template tokens.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// Zero padding of a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum NumberingStyle {
    /// `1, 2, 3`
    NoPad,
    /// `01, 02, 03`
    OnePad,
    /// `001, 002, 003`
    TwoPad,
}

impl NumberingStyle {
    /// Tag label as shown in a template.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoPad => "[1, 2, 3]",
            Self::OnePad => "[01, 02, 03]",
            Self::TwoPad => "[001, 002, 003]",
        }
    }

    /// Format a sequence number.
    pub fn format(&self, number: usize) -> String {
        match self {
            Self::NoPad => format!("{}", number),
            Self::OnePad => format!("{:02}", number),
            Self::TwoPad => format!("{:03}", number),
        }
    }
}

/// A piece of per-file metadata a template can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum MetadataKind {
    OriginalFileName,
    CreationDate,
    CameraModel,
    SeasonNumber,
    EpisodeNumber,
    TrackNumber,
    ArtistName,
    Title,
    AlbumName,
}

impl MetadataKind {
    /// Tag label as shown in a template.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OriginalFileName => "[Original file name]",
            Self::CreationDate => "[Creation date]",
            Self::CameraModel => "[Camera model]",
            Self::SeasonNumber => "[Season number]",
            Self::EpisodeNumber => "[Episode number]",
            Self::TrackNumber => "[Track number]",
            Self::ArtistName => "[Artist name]",
            Self::Title => "[Title]",
            Self::AlbumName => "[Album name]",
        }
    }
}

/// One element of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateToken {
    Numbering(NumberingStyle),
    Metadata(MetadataKind),
    Text(String),
}

impl TemplateToken {
    /// The text this token was parsed from.
    pub fn label(&self) -> &str {
        match self {
            Self::Numbering(style) => style.label(),
            Self::Metadata(kind) => kind.label(),
            Self::Text(text) => text,
        }
    }
}

fn known_tags() -> impl Iterator<Item = TemplateToken> {
    NumberingStyle::iter()
        .map(TemplateToken::Numbering)
        .chain(MetadataKind::iter().map(TemplateToken::Metadata))
}

/// Split a template string into tokens.
///
/// Recognised tag labels become numbering or metadata tokens; everything
/// else, including unknown bracketed text, is kept as literal text.
pub fn parse_template(template: &str) -> Vec<TemplateToken> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut rest = template;

    while let Some(ch) = rest.chars().next() {
        let tag = if ch == '[' {
            known_tags().find(|tag| rest.starts_with(tag.label()))
        } else {
            None
        };

        match tag {
            Some(tag) => {
                if !text.is_empty() {
                    tokens.push(TemplateToken::Text(std::mem::take(&mut text)));
                }
                rest = &rest[tag.label().len()..];
                tokens.push(tag);
            }
            None => {
                text.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    if !text.is_empty() {
        tokens.push(TemplateToken::Text(text));
    }

    tokens
}

/// Whether a template numbers the files it renames.
pub fn has_numbering(tokens: &[TemplateToken]) -> bool {
    tokens
        .iter()
        .any(|t| matches!(t, TemplateToken::Numbering(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_template() {
        let tokens = parse_template("Holiday [01, 02, 03] - [Original file name]");

        assert_eq!(
            tokens,
            vec![
                TemplateToken::Text("Holiday ".to_string()),
                TemplateToken::Numbering(NumberingStyle::OnePad),
                TemplateToken::Text(" - ".to_string()),
                TemplateToken::Metadata(MetadataKind::OriginalFileName),
            ]
        );
    }

    #[test]
    fn test_unknown_tags_are_text() {
        let tokens = parse_template("[draft] [Title]");
        assert_eq!(
            tokens,
            vec![
                TemplateToken::Text("[draft] ".to_string()),
                TemplateToken::Metadata(MetadataKind::Title),
            ]
        );
    }

    #[test]
    fn test_adjacent_tags() {
        let tokens = parse_template("[Season number][Episode number]");
        assert_eq!(
            tokens,
            vec![
                TemplateToken::Metadata(MetadataKind::SeasonNumber),
                TemplateToken::Metadata(MetadataKind::EpisodeNumber),
            ]
        );
    }

    #[test]
    fn test_empty_template() {
        assert!(parse_template("").is_empty());
    }

    #[test]
    fn test_numbering_format() {
        assert_eq!(NumberingStyle::NoPad.format(7), "7");
        assert_eq!(NumberingStyle::OnePad.format(7), "07");
        assert_eq!(NumberingStyle::TwoPad.format(7), "007");
        assert_eq!(NumberingStyle::OnePad.format(123), "123");
    }

    #[test]
    fn test_labels_round_trip_through_parser() {
        for tag in known_tags() {
            assert_eq!(parse_template(tag.label()), vec![tag]);
        }
    }
}
