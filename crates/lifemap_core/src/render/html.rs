//! HTML page template.

use crate::service::breadcrumb::Crumb;
use crate::service::classify::due_label;
use crate::service::projection::{ProjectedNode, Projection};
use chrono::NaiveDate;

const GROUP_COLORS: [&str; 4] = ["green", "blue", "purple", "red"];

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 0; background: #fafafa; color: #222; }
nav.breadcrumb { padding: 12px 24px; font-size: 14px; background: #fff; border-bottom: 1px solid #eee; }
nav.breadcrumb a { color: #555; text-decoration: none; }
nav.breadcrumb a:hover { text-decoration: underline; }
nav.breadcrumb .sep { color: #bbb; margin: 0 6px; }
nav.breadcrumb .current { font-weight: 600; }
header { padding: 24px 24px 8px; }
header h1 { margin: 0; font-size: 28px; }
header .context { color: #666; margin: 6px 0 0; }
.notice { margin: 0 24px; padding: 8px 12px; background: #fff4e5; border-radius: 6px; font-size: 14px; }
main { display: grid; grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); gap: 16px; padding: 16px 24px; }
.group { background: #fff; border-radius: 10px; padding: 14px; border-top: 4px solid var(--accent); }
.group-green { --accent: #2e9e5b; }
.group-blue { --accent: #2f6fd0; }
.group-purple { --accent: #7b4bc4; }
.group-red { --accent: #d04545; }
.item { margin: 4px 0; }
.item .children { margin-left: 14px; border-left: 1px dashed #ddd; padding-left: 10px; }
.item.clickable > .item-head { cursor: pointer; }
.item.clickable > .item-head:hover .title { color: var(--accent); }
.item.virtual > .item-head .title { font-style: italic; }
.level-1 > .item-head .title { font-size: 18px; font-weight: 600; }
.title.has-progress { background-image: linear-gradient(var(--accent), var(--accent)); background-repeat: no-repeat; background-position: 0 100%; background-size: var(--progress) 2px; }
.due { font-size: 11px; font-weight: 600; border-radius: 4px; padding: 1px 6px; margin-left: 6px; }
.due-overdue { background: #fde2e2; color: #b42318; }
.due-today { background: #fff1c2; color: #8a5a00; }
.due-soon { background: #e3efff; color: #1d4ed8; }
.due-later { background: #f1f1f1; color: #555; }
.due-invalid { background: #f1f1f1; color: #999; text-decoration: line-through; }
.context { color: #666; font-size: 13px; }
.path { color: #999; font-size: 12px; }
.empty { color: #999; padding: 24px; }
footer { color: #999; font-size: 12px; padding: 16px 24px 32px; }
"#;

const SCRIPT: &str = r#"
function navigateToItem(id, event) {
  if (event) { event.stopPropagation(); }
  window.location.href = id + '.html';
}
"#;

/// Everything one page shows.
#[derive(Debug, Clone, Copy)]
pub struct PageView<'a> {
    pub projection: &'a Projection,
    pub breadcrumb: &'a [Crumb],
}

/// Renders a complete HTML document for one page.
pub fn render_page(view: &PageView<'_>, today: NaiveDate) -> String {
    let projection = view.projection;
    let mut out = String::with_capacity(8 * 1024);
    let title = escape_html(&projection.title);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    out.push_str(&format!("<title>{title}</title>\n"));
    out.push_str(&format!("<style>{STYLE}</style>\n"));
    out.push_str("</head>\n<body>\n");

    if !view.breadcrumb.is_empty() {
        out.push_str("<nav class=\"breadcrumb\">");
        for crumb in view.breadcrumb {
            out.push_str(&format!(
                "<a href=\"{}\">{}</a><span class=\"sep\">&rsaquo;</span>",
                escape_html(&crumb.href),
                escape_html(&crumb.title)
            ));
        }
        out.push_str(&format!("<span class=\"current\">{title}</span>"));
        out.push_str("</nav>\n");
    }

    out.push_str(&format!("<header><h1>{title}</h1>"));
    if let Some(context) = &projection.context {
        out.push_str(&format!("<p class=\"context\">{}</p>", escape_html(context)));
    }
    out.push_str("</header>\n");

    if projection.fell_back {
        out.push_str(&format!(
            "<p class=\"notice\">No entry named <code>{}</code>; showing the top level.</p>\n",
            escape_html(&projection.requested_id)
        ));
    }

    if projection.items.is_empty() {
        out.push_str("<p class=\"empty\">Nothing here yet.</p>\n");
    } else {
        out.push_str("<main>\n");
        for (position, item) in projection.items.iter().enumerate() {
            let color = GROUP_COLORS[position % GROUP_COLORS.len()];
            out.push_str(&format!("<section class=\"group group-{color}\">"));
            render_item(&mut out, item, 1, today);
            out.push_str("</section>\n");
        }
        out.push_str("</main>\n");
    }

    out.push_str(&format!(
        "<footer>Updated: {}</footer>\n",
        today.format("%B %d, %Y")
    ));
    out.push_str(&format!("<script>{SCRIPT}</script>\n"));
    out.push_str("</body>\n</html>\n");
    out
}

fn render_item(out: &mut String, item: &ProjectedNode, level: usize, today: NaiveDate) {
    let mut classes = format!("item level-{level}");
    if item.is_clickable() {
        classes.push_str(" clickable");
    }
    if item.is_virtual {
        classes.push_str(" virtual");
    }
    out.push_str(&format!(
        "<div class=\"{classes}\" data-id=\"{}\">",
        escape_html(&item.id)
    ));

    if item.is_clickable() {
        out.push_str(
            "<div class=\"item-head\" onclick=\"navigateToItem(this.parentElement.dataset.id, event)\">",
        );
    } else {
        out.push_str("<div class=\"item-head\">");
    }
    match item.progress {
        Some(progress) => {
            out.push_str(&format!(
                "<span class=\"title has-progress\" style=\"--progress: {progress}%\" title=\"{progress}% complete\">{}</span>",
                escape_html(&item.title)
            ));
        }
        None => {
            out.push_str(&format!("<span class=\"title\">{}</span>", escape_html(&item.title)));
        }
    }
    if let Some(due) = &item.due {
        match due.date() {
            Some(date) => {
                let label = due_label(date, today);
                out.push_str(&format!(
                    "<span class=\"due {}\">{}</span>",
                    label.css_class,
                    escape_html(&label.text)
                ));
            }
            None => {
                out.push_str(&format!(
                    "<span class=\"due due-invalid\">{}</span>",
                    escape_html(due.raw())
                ));
            }
        }
    }
    out.push_str("</div>");

    if let Some(context) = &item.context {
        out.push_str(&format!("<div class=\"context\">{}</div>", escape_html(context)));
    }
    if let Some(path) = item.path.as_deref().filter(|path| !path.is_empty()) {
        out.push_str(&format!("<div class=\"path\">{}</div>", escape_html(path)));
    }

    if !item.children.is_empty() {
        out.push_str("<div class=\"children\">");
        for child in &item.children {
            render_item(out, child, level + 1, today);
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
}

/// Escapes text for HTML element and attribute content.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
