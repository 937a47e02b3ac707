use pindex_core::html::{clean_html, html_words};
use pindex_core::tokenizer::{normalize_word, parse_words};

#[test]
fn it_case_folds_and_strips_symbols() {
    let words = parse_words("Running, RUNNER's run! snake_case 42nd");
    assert_eq!(words, vec!["running", "runners", "run", "snakecase", "42nd"]);
}

#[test]
fn it_keeps_unicode_letters() {
    // NFKC folds the compatibility ligature, accents survive
    assert_eq!(normalize_word("Café"), "café");
    assert_eq!(normalize_word("ﬁne"), "fine");
}

#[test]
fn it_drops_tokens_with_no_word_characters() {
    assert!(parse_words(" -- ... !! ").is_empty());
}

#[test]
fn it_cleans_a_whole_page() {
    let page = r#"<!DOCTYPE html>
<html><head><title>Home</title>
<style type="text/css">body { font-size: 10pt; }</style>
<script>document.write("<p>hidden</p>");</script>
</head>
<body><h1>Hello&nbsp;World</h1><p>2010&ndash;2012 <a href="x.html">more</a></p></body></html>"#;
    assert_eq!(html_words(page), vec!["home", "hello", "world", "2010", "2012", "more"]);
    assert!(!clean_html(page).contains("font-size"));
}
