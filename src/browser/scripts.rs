//! Script bodies evaluated in the page
//!
//! Each constant is the body of a function: arguments arrive as
//! `arguments[0..]` and the result is reported with `return`.

/// `document.readyState`
pub const READY_STATE: &str = "return document.readyState;";

/// Current scroll height of the body
pub const SCROLL_HEIGHT: &str = "return document.body ? document.body.scrollHeight : 0;";

/// Scrolls to the bottom of the body
pub const SCROLL_TO_BOTTOM: &str =
    "window.scrollTo(0, document.body ? document.body.scrollHeight : 0); return null;";

/// Scrolls vertically by `arguments[0]` pixels
pub const SCROLL_BY: &str = "window.scrollBy(0, arguments[0]); return null;";

/// `[innerWidth, innerHeight]`
pub const VIEWPORT_SIZE: &str = "return [window.innerWidth, window.innerHeight];";

/// Describes the element at point (`arguments[0]`, `arguments[1]`)
///
/// Returns `null` or `{tag, href}`. Clicks on children of an anchor or button
/// are reported against that anchor or button.
pub const ELEMENT_AT_POINT: &str = r#"
var el = document.elementFromPoint(arguments[0], arguments[1]);
if (!el) { return null; }
var target = el.closest('a, button') || el;
return {
    tag: target.tagName.toLowerCase(),
    href: target.tagName.toLowerCase() === 'a' ? (target.href || '') : ''
};
"#;

/// Clicks the element at point (`arguments[0]`, `arguments[1]`)
///
/// Returns `'missing'` when nothing is there, `'intercepted'` when another
/// element covers the target's centre, `'clicked'` otherwise.
pub const CLICK_AT_POINT: &str = r#"
var el = document.elementFromPoint(arguments[0], arguments[1]);
if (!el) { return 'missing'; }
var target = el.closest('a, button') || el;
var rect = target.getBoundingClientRect();
var top = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
if (top && top !== target && !target.contains(top)) { return 'intercepted'; }
target.click();
return 'clicked';
"#;

/// Anchors matching selector `arguments[0]` as `[{text, href}]`
pub const ZONE_LINKS: &str = r#"
var out = [];
document.querySelectorAll(arguments[0]).forEach(function (a) {
    out.push({ text: (a.innerText || a.textContent || '').trim(), href: a.href || '' });
});
return out;
"#;

/// Iframes of the document as `[{index, src}]`
pub const FRAMES: &str = r#"
var out = [];
document.querySelectorAll('iframe').forEach(function (f, i) {
    out.push({ index: i, src: f.src || '' });
});
return out;
"#;
