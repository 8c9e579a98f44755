use serde::Deserialize;

const DELIMITER: &str = "+++";

/// Metadata a Markdown upload may declare in a leading `+++` TOML block.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub brief: Option<String>,
}

/// A post as described by an uploaded document.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub brief: String,
    pub content: String,
}

impl PostDraft {
    /// Split an upload preview into metadata and Markdown body.
    ///
    /// Without front matter the whole text is the content and the title comes
    /// from the first `# ` heading. An opening `+++` without a closing one is
    /// treated as ordinary content.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let Some((header, body)) = split_front_matter(text) else {
            return Ok(Self {
                title: first_heading(text),
                slug: None,
                brief: String::new(),
                content: text.to_string(),
            });
        };

        let meta: FrontMatter = toml::from_str(header)?;
        Ok(Self {
            title: non_blank(meta.title).or_else(|| first_heading(body)),
            slug: non_blank(meta.slug),
            brief: meta.brief.unwrap_or_default(),
            content: body.to_string(),
        })
    }
}

fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix(DELIMITER)?
        .strip_prefix("\r\n")
        .or_else(|| text[DELIMITER.len()..].strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((header, body));
        }
        offset += line.len();
    }
    None
}

fn first_heading(text: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
