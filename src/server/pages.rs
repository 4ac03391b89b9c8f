//! Server-rendered HTML for the listing UI.
//!
//! Page shells live in `templates/` and are embedded at compile time; the
//! functions here fill `{{placeholder}}` tokens. No template engine, just
//! string substitution over trusted shells with escaped values.

use crate::listing::{Listing, ObjectRecord, SNAPSHOT_SUFFIX};
use crate::store::BucketName;
use crate::utils::{format_bytes, format_timestamp};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

const HOME_HTML: &str = include_str!("../../templates/home.html");
const LISTING_HTML: &str = include_str!("../../templates/listing.html");
const CARD_HTML: &str = include_str!("../../templates/card.html");
const PAGINATION_HTML: &str = include_str!("../../templates/pagination.html");

/// Bytes escaped inside URL path segments. `/` stays literal so keys keep
/// their directory structure in download links.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'?')
    .add(b'%')
    .add(b'+')
    .add(b'{')
    .add(b'}');

/// Parameters a listing page was requested with, after clamping.
#[derive(Debug, Clone)]
pub struct PageContext<'a> {
    /// Page heading
    pub title: &'a str,
    /// Bucket the download links point at
    pub bucket: BucketName,
    /// Active search filter, if any
    pub search: Option<&'a str>,
    /// Page size, already clamped to `[1, 100]`
    pub limit: usize,
    /// Item offset, already floored at 0
    pub offset: usize,
}

/// Renders the archive home page.
pub fn render_home_page() -> String {
    HOME_HTML.to_string()
}

/// Renders a full listing page: snapshot cards plus the pagination bar.
///
/// Only `.car.zst` keys become cards; sidecars and other keys count toward
/// the totals but are not rendered.
pub fn render_listing_page(ctx: &PageContext<'_>, listing: &Listing) -> String {
    let mut body = String::from("<div id=\"snapshotGrid\" class=\"flex flex-col gap-4\">\n");

    for object in &listing.objects {
        if !object.key.ends_with(SNAPSHOT_SUFFIX) {
            continue;
        }
        body.push_str(&render_card(ctx.bucket, object));
    }

    body.push_str("</div>\n");
    body.push_str(&render_pagination(ctx, listing));

    LISTING_HTML
        .replace("{{title}}", &html_escape(ctx.title))
        .replace("{{bodyContent}}", &body)
        .replace("{{searchValue}}", &html_escape(ctx.search.unwrap_or("")))
}

fn render_card(bucket: BucketName, object: &ObjectRecord) -> String {
    let encoded_key = utf8_percent_encode(&object.key, PATH).to_string();
    let base = format!("/archive/{bucket}/{encoded_key}");

    CARD_HTML
        .replace("{{key}}", &html_escape(&object.key))
        .replace("{{base}}", &html_escape(&base))
        .replace("{{fileSize}}", &format_bytes(object.size))
        .replace("{{uploaded}}", &format_timestamp(&object.uploaded))
}

fn render_pagination(ctx: &PageContext<'_>, listing: &Listing) -> String {
    let total = listing.total_count;
    let limit = ctx.limit.max(1);

    let start_item = if total == 0 { 0 } else { ctx.offset + 1 };
    let end_item = (ctx.offset + limit).min(total);

    let current_page = ctx.offset / limit + 1;
    let total_pages = total.div_ceil(limit);

    let search_info = ctx
        .search
        .map(|query| format!(" (filtered by &quot;{}&quot;)", html_escape(query)))
        .unwrap_or_default();

    let previous_button = if ctx.offset > 0 {
        let prev_offset = ctx.offset.saturating_sub(limit);
        format!(
            "<button onclick=\"goToPage({prev_offset})\" \
             class=\"px-4 py-2 bg-gray-800/50 border border-gray-600/50 text-gray-300 \
             rounded-xl hover:bg-gray-700/50 hover:text-white transition-all\">Previous</button>"
        )
    } else {
        String::new()
    };

    let next_button = if listing.has_more {
        let next_offset = ctx.offset + limit;
        format!(
            "<button onclick=\"goToPage({next_offset})\" \
             class=\"px-4 py-2 bg-gray-800/50 border border-gray-600/50 text-gray-300 \
             rounded-xl hover:bg-gray-700/50 hover:text-white transition-all\">Next</button>"
        )
    } else {
        String::new()
    };

    // Page buttons for a window of two pages either side of the current one.
    let start_page = current_page.saturating_sub(2).max(1);
    let end_page = (current_page + 2).min(total_pages);
    let mut page_numbers = String::new();
    for page in start_page..=end_page {
        let page_offset = (page - 1) * limit;
        let class = if page == current_page {
            "bg-green-600 text-white"
        } else {
            "bg-gray-800/50 border border-gray-600/50 text-gray-300 hover:text-white"
        };
        page_numbers.push_str(&format!(
            "<button onclick=\"goToPage({page_offset})\" \
             class=\"px-4 py-2 rounded-xl transition-all font-medium {class}\">{page}</button>"
        ));
    }

    PAGINATION_HTML
        .replace("{{startItem}}", &start_item.to_string())
        .replace("{{endItem}}", &end_item.to_string())
        .replace("{{totalCount}}", &total.to_string())
        .replace("{{searchInfo}}", &search_info)
        .replace("{{limit10Selected}}", selected(limit, 10))
        .replace("{{limit20Selected}}", selected(limit, 20))
        .replace("{{limit50Selected}}", selected(limit, 50))
        .replace("{{limit100Selected}}", selected(limit, 100))
        .replace("{{previousButton}}", &previous_button)
        .replace("{{pageNumbers}}", &page_numbers)
        .replace("{{nextButton}}", &next_button)
}

fn selected(limit: usize, option: usize) -> &'static str {
    if limit == option { "selected" } else { "" }
}

/// Escapes a value for interpolation into HTML text or attributes.
fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
