//! Turning raw HTML into the word stream that gets indexed.
//!
//! The pipeline is regex based rather than a DOM parse: `<script>` and
//! `<style>` elements are dropped with their contents, every remaining tag is
//! replaced by a space, entities are replaced by a space, and what is left is
//! tokenized like plain text. All functions are pure.

use crate::tokenizer::parse_words;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    static ref SCRIPT: Regex = element_regex("script");
    static ref STYLE: Regex = element_regex("style");
    static ref TAG: Regex = Regex::new(r"(?s)<[^>]*>").expect("valid regex");
    static ref ENTITY: Regex = Regex::new(r"&#?[A-Za-z0-9]+;").expect("valid regex");
}

fn element_regex(name: &str) -> Regex {
    let name = regex::escape(name);
    Regex::new(&format!(r"(?is)<{name}\b[^>]*>.*?</{name}\s*>")).expect("valid regex")
}

/// Removes every `name` element, opening tag through closing tag, ignoring case.
pub fn strip_element(name: &str, html: &str) -> String {
    let stripped = match name.to_ascii_lowercase().as_str() {
        "script" => SCRIPT.replace_all(html, " "),
        "style" => STYLE.replace_all(html, " "),
        _ => Cow::Owned(element_regex(name).replace_all(html, " ").into_owned()),
    };
    stripped.into_owned()
}

pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, " ").into_owned()
}

/// Replaces entities such as `&amp;` or `&#8211;` with a space.
pub fn strip_entities(html: &str) -> String {
    ENTITY.replace_all(html, " ").into_owned()
}

pub fn clean_html(html: &str) -> String {
    let text = strip_element("script", html);
    let text = strip_element("style", &text);
    let text = strip_tags(&text);
    strip_entities(&text)
}

pub fn html_words(html: &str) -> Vec<String> {
    parse_words(&clean_html(html))
}
