//! Link segmenter behavior on realistic posts.

use telerelay::filters::remove_links;

#[test]
fn removes_only_the_sentence_with_the_link() {
    let out = remove_links("Check this: https://x.com/a. It's great!", "x.com");
    assert_eq!(out, "It's great!");
    assert!(!out.starts_with(' '));
    assert!(!out.contains("\n\n\n"));
}

#[test]
fn keeps_sentences_before_and_after() {
    let out = remove_links(
        "Big news today! Read more at https://x.com/story. Stay tuned.",
        "x.com",
    );
    assert_eq!(out, "Big news today! Stay tuned.");
}

#[test]
fn link_on_its_own_line() {
    let message = "Headline\nhttps://x.com/post\nFooter text";
    assert_eq!(remove_links(message, "x.com"), "Headline\nFooter text");
}

#[test]
fn trailing_link_line_leaves_no_trailing_newline() {
    let message = "Headline\n\nhttps://x.com/post";
    assert_eq!(remove_links(message, "x.com"), "Headline");
}

#[test]
fn domain_match_is_by_substring() {
    let message = "Mirror: https://sub.x.com/a\nKeep me";
    assert_eq!(remove_links(message, "x.com"), "Keep me");
}

#[test]
fn bare_domain_word_without_inner_dot_is_ignored() {
    // "xcom" has no interior dot, so it is not treated as a link.
    let message = "Follow xcom for updates.";
    assert_eq!(remove_links(message, "xcom"), message);
}

#[test]
fn repeated_identical_link_is_removed_once() {
    let message = "One https://x.com/a\nTwo\nThree https://x.com/a";
    let out = remove_links(message, "x.com");
    assert_eq!(out.matches("https://x.com/a").count(), 1);
    assert!(out.starts_with("Two\n"));
}

#[test]
fn unicode_text_around_links_survives() {
    let message = "Привет! Смотри https://x.com/a. Пока!";
    assert_eq!(remove_links(message, "x.com"), "Привет! Пока!");
}

#[test]
fn message_without_links_is_untouched() {
    let message = "\n  plain text, no links!  \n";
    assert_eq!(remove_links(message, "x.com"), message);
}

#[test]
fn long_blank_runs_collapse_to_one_empty_line() {
    let message = "a\n\n\n\n\nhttps://x.com/q\n\n\n\n\nb";
    assert_eq!(remove_links(message, "x.com"), "a\n\nb");
}
