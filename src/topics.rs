//! Typed model of the "my topics" list page
//!
//! A topic list page has a `div#Wrapper` root, one `div.cell.item` per
//! topic and a pagination input whose `max` attribute is the page count.

use std::sync::LazyLock;

use crate::derived::Derivation;
use crate::error::ExtractError;
use crate::extractors::{extract, Record};
use crate::mapping::{FieldType, Mapping, MappingSpec, SchemaSpec};
use crate::validity;

static MY_TOPICS: LazyLock<Result<Mapping, ExtractError>> = LazyLock::new(|| {
    let item = SchemaSpec::new()
        .attr("user_link", r#"td > a[href^="/member"]"#, "href")
        .attr("avatar", "img.avatar", "src")
        .text("title", "span.item_title")
        .attr("link", "span.item_title a", "href")
        .int("comment_num", "a[class^=count_]")
        .text("tag_title", "a.node")
        .attr("tag_link", "a.node", "href")
        .own_text("time", "span.small.fade")
        .derive("id", "link", Derivation::topic_id())
        .derive("user_name", "user_link", Derivation::LastSegment)
        .derive("avatar_url", "avatar", Derivation::avatar())
        .derive("elapsed", "time", Derivation::elapsed_time())
        .derive("tag_name", "tag_link", Derivation::tag_name());
    let page = SchemaSpec::new()
        .field("total", "input.page_input", "attr:max", FieldType::Int)
        .children("items", "div.cell.item", item)
        .validity("items", "title");
    MappingSpec::new("div#Wrapper", page).compile()
});

/// Compiled mapping for the topic list page, built once per process
pub fn my_topics_mapping() -> Result<&'static Mapping, ExtractError> {
    MY_TOPICS.as_ref().map_err(Clone::clone)
}

/// One parsed topic list page
#[derive(Debug, Clone, PartialEq)]
pub struct MyTopicsInfo {
    total: i64,
    items: Vec<TopicItem>,
}

impl MyTopicsInfo {
    pub fn parse(html: &str) -> Result<Self, ExtractError> {
        let mut record = extract(html, my_topics_mapping()?)?;
        let items = record
            .take_children("items")
            .into_iter()
            .map(TopicItem)
            .collect();
        Ok(Self {
            total: record.int("total"),
            items,
        })
    }

    /// Pagination total, 0 when the page has no pagination input
    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn items(&self) -> &[TopicItem] {
        &self.items
    }

    /// An empty page is valid; otherwise the first topic must have a title
    pub fn is_valid(&self) -> bool {
        validity::first_title_present(self.items.iter().map(TopicItem::title))
    }
}

/// One topic row
#[derive(Debug, Clone, PartialEq)]
pub struct TopicItem(Record);

impl TopicItem {
    pub fn user_link(&self) -> &str {
        self.0.string("user_link")
    }

    /// Member name out of the profile link; `None` when there is no link
    pub fn user_name(&self) -> Option<&str> {
        self.0.derived("user_name")
    }

    /// Normalized avatar URL
    pub fn avatar(&self) -> &str {
        self.0.derived("avatar_url").unwrap_or("")
    }

    pub fn title(&self) -> &str {
        self.0.string("title")
    }

    pub fn link(&self) -> &str {
        self.0.string("link")
    }

    /// Topic id out of the topic link
    pub fn id(&self) -> &str {
        self.0.derived("id").unwrap_or("")
    }

    pub fn comment_num(&self) -> i64 {
        self.0.int("comment_num")
    }

    pub fn tag_title(&self) -> &str {
        self.0.string("tag_title")
    }

    pub fn tag_link(&self) -> &str {
        self.0.string("tag_link")
    }

    /// Node short name out of the node link
    pub fn tag_name(&self) -> &str {
        self.0.derived("tag_name").unwrap_or("")
    }

    /// Elapsed-time phrase such as `36天前`
    pub fn time(&self) -> &str {
        self.0.derived("elapsed").unwrap_or("")
    }

    pub fn record(&self) -> &Record {
        &self.0
    }
}
