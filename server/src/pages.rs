// pages.rs
//
// HTML pages served under /test1 and /mirror. Everything interpolated from
// client input or stored state goes through `escape_html`.
use rocket::serde::json::{self, Value};

use crate::mirror::{MirrorError, MirrorRow};
use crate::record::Record;

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; max-width: 860px; margin: 40px auto; padding: 20px; background: #f5f5f5; }
        .card { background: white; padding: 20px; border-radius: 8px; margin-bottom: 20px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .form-group { margin: 12px 0; }
        label { display: block; margin-bottom: 4px; font-weight: bold; }
        input, textarea { width: 100%; padding: 8px; border: 1px solid #ddd; border-radius: 4px; box-sizing: border-box; }
        button { background: #007bff; color: white; padding: 10px 18px; border: none; border-radius: 4px; cursor: pointer; margin: 4px; }
        button:hover { background: #0056b3; }
        .success { background: #d4edda; border: 1px solid #c3e6cb; color: #155724; padding: 15px; border-radius: 4px; }
        .error { background: #f8d7da; border: 1px solid #f5c6cb; color: #721c24; padding: 15px; border-radius: 4px; }
        .item { margin: 12px 0; padding: 12px; background: #f8f9fa; border-left: 4px solid #007bff; border-radius: 4px; }
        .item h3 { margin: 0 0 8px 0; color: #007bff; }
        .value { background: #e9ecef; padding: 8px; border-radius: 4px; font-family: monospace; white-space: pre-wrap; word-break: break-all; }
        .stats { background: #e3f2fd; padding: 12px; border-radius: 4px; margin-bottom: 16px; }
        .empty { text-align: center; color: #6c757d; padding: 30px; }
        .nav a { color: #007bff; text-decoration: none; margin-right: 18px; }
        .nav a:hover { text-decoration: underline; }
"#;

const TEST_PAGE_BODY: &str = r#"
    <h1>Simple Data Test Page</h1>
    <p>Exercise the API endpoints from the browser.</p>

    <div class="card">
        <h2>Create a record</h2>
        <form id="dataForm">
            <div class="form-group">
                <label for="name">Name</label>
                <input type="text" id="name" required placeholder="Record name">
            </div>
            <div class="form-group">
                <label for="value">Value (JSON, or plain text)</label>
                <input type="text" id="value" required placeholder='42, "text", {"k": 1}'>
            </div>
            <div class="form-group">
                <label for="description">Description</label>
                <textarea id="description" rows="3" placeholder="Optional"></textarea>
            </div>
            <button type="submit">POST /data</button>
            <button type="button" onclick="loadData()">Load all</button>
            <button type="button" onclick="clearDisplay()">Clear</button>
        </form>
        <div id="response"></div>
    </div>

    <div class="card">
        <h2>Stored records</h2>
        <div id="dataList"></div>
    </div>

    <div class="nav">
        <a href="/test1/mydata">Server-rendered view</a>
        <a href="/mirror/view">Mirrored rows</a>
        <a href="/data">Raw JSON</a>
        <a href="/health">Health</a>
    </div>

    <script>
        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }

        function parseValue(raw) {
            try { return JSON.parse(raw); } catch (e) { return raw; }
        }

        document.getElementById('dataForm').addEventListener('submit', async (e) => {
            e.preventDefault();
            const body = {
                name: document.getElementById('name').value,
                value: parseValue(document.getElementById('value').value),
                description: document.getElementById('description').value || null
            };
            const target = document.getElementById('response');
            try {
                const response = await fetch('/data', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(body)
                });
                const result = await response.json();
                if (!response.ok) {
                    throw new Error(result.detail || 'request failed');
                }
                target.innerHTML = '<div class="success"><strong>Created</strong><br>' +
                    escapeHtml(result.message) + '<br>ID: ' + result.data.id +
                    '<br>Total items: ' + result.total_items + '</div>';
                document.getElementById('dataForm').reset();
                loadData();
            } catch (error) {
                target.innerHTML = '<div class="error"><strong>Error</strong><br>' + escapeHtml(error.message) + '</div>';
            }
        });

        async function loadData() {
            const target = document.getElementById('dataList');
            try {
                const response = await fetch('/data');
                const data = await response.json();
                if (data.length === 0) {
                    target.innerHTML = '<p class="empty">No records stored yet.</p>';
                    return;
                }
                let html = '<p><strong>Total items: ' + data.length + '</strong></p>';
                data.forEach(item => {
                    html += '<div class="item"><h3>#' + item.id + ': ' + escapeHtml(item.name) + '</h3>' +
                        '<div class="value">' + escapeHtml(JSON.stringify(item.value)) + '</div>' +
                        (item.description ? '<p>' + escapeHtml(item.description) + '</p>' : '') +
                        '</div>';
                });
                target.innerHTML = html;
            } catch (error) {
                target.innerHTML = '<div class="error">Error loading data: ' + escapeHtml(error.message) + '</div>';
            }
        }

        function clearDisplay() {
            document.getElementById('response').innerHTML = '';
            document.getElementById('dataList').innerHTML = '';
        }

        loadData();
    </script>
"#;

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"utf-8\">\n    <title>{}</title>\n    <style>{}</style>\n</head>\n<body>{}</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

// Strings render bare, everything else as pretty JSON.
fn render_value(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => json::serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    escape_html(&text)
}

fn render_item(id: i64, name: &str, value: &Value, description: Option<&str>, footer: &str) -> String {
    let description = description
        .map(|d| format!("<p><strong>Description:</strong> {}</p>", escape_html(d)))
        .unwrap_or_default();
    format!(
        r#"
        <div class="item">
            <h3>Item #{id}: {name}</h3>
            <div class="value">{value}</div>
            {description}
            <small style="color: #6c757d;">{footer}</small>
        </div>"#,
        id = id,
        name = escape_html(name),
        value = render_value(value),
        description = description,
        footer = escape_html(footer),
    )
}

pub fn test_page() -> String {
    layout("Simple Data Test Page", TEST_PAGE_BODY)
}

/// Server-rendered listing of every stored record.
pub fn my_data_page(records: &[Record], rendered_at: &str) -> String {
    let items = if records.is_empty() {
        String::from(
            r#"<div class="empty"><h3>No data found</h3><p>Use <a href="/test1">the test form</a> to add some.</p></div>"#,
        )
    } else {
        records
            .iter()
            .map(|r| {
                render_item(
                    r.id,
                    &r.name,
                    &r.value,
                    r.description.as_deref(),
                    &format!("ID: {}", r.id),
                )
            })
            .collect::<String>()
    };
    let body = format!(
        r#"
    <div class="card">
        <h1>My Data Store</h1>
        <p>All records currently held by this service.</p>
    </div>
    <div class="card">
        <div class="stats">
            <strong>Total items:</strong> <span id="totalCount">{total}</span> |
            <strong>Rendered at:</strong> {rendered_at}
        </div>
        {items}
    </div>
    <div class="nav">
        <a href="/test1">Back to test form</a>
        <a href="/data">Raw JSON</a>
        <a href="/health">Health</a>
        <a href="/test1/mydata">Refresh</a>
    </div>
"#,
        total = records.len(),
        rendered_at = escape_html(rendered_at),
        items = items,
    );
    layout("My Data", &body)
}

/// Confirmation page for a record created from a URL path segment.
pub fn url_data_page(record: &Record, total_items: usize) -> String {
    let value = render_value(&record.value);
    let body = format!(
        r#"
    <h1>Data received</h1>
    <div class="success">
        <h3>Your data has been stored.</h3>
        <p><strong>Data received:</strong> "{value}"</p>
        <p><strong>Assigned ID:</strong> {id}</p>
        <p><strong>Total items stored:</strong> {total}</p>
    </div>
    <div class="card">
        <h4>Stored item</h4>
        <p><strong>ID:</strong> {id}</p>
        <p><strong>Name:</strong> {name}</p>
        <p><strong>Value:</strong> {value}</p>
        <p><strong>Description:</strong> {description}</p>
    </div>
    <div class="nav">
        <a href="/test1/mydata">View all data</a>
        <a href="/data">JSON data</a>
        <a href="/test1">Test form</a>
        <a href="/">Home</a>
    </div>
    <h3>More examples</h3>
    <ul>
        <li><a href="/test1/hello_world">/test1/hello_world</a></li>
        <li><a href="/test1/12345">/test1/12345</a></li>
        <li><a href="/test1/test_data_123">/test1/test_data_123</a></li>
    </ul>
"#,
        value = value,
        id = record.id,
        total = total_items,
        name = escape_html(&record.name),
        description = escape_html(record.description.as_deref().unwrap_or("")),
    );
    layout("Data Received", &body)
}

/// Listing of rows held by the external mirror, or why they could not be read.
pub fn mirror_page(rows: Result<&[MirrorRow], &MirrorError>, rendered_at: &str) -> String {
    let content = match rows {
        Ok([]) => String::from(r#"<div class="empty"><h3>The mirror table is empty</h3></div>"#),
        Ok(rows) => {
            let items = rows
                .iter()
                .map(|r| {
                    render_item(
                        r.id,
                        &r.name,
                        &r.value,
                        r.description.as_deref(),
                        &format!("Mirrored at {}", r.timestamp),
                    )
                })
                .collect::<String>();
            format!(
                r#"<div class="stats"><strong>Mirrored rows:</strong> {}</div>{}"#,
                rows.len(),
                items
            )
        }
        Err(e) => format!(
            r#"<div class="error"><strong>Mirror unavailable:</strong> {}</div>"#,
            escape_html(&e.to_string())
        ),
    };
    let body = format!(
        r#"
    <div class="card">
        <h1>Mirrored Data</h1>
        <p>Rows copied to the external mirror. Rendered at {rendered_at}.</p>
    </div>
    <div class="card">{content}</div>
    <div class="nav">
        <a href="/test1/mydata">Local data</a>
        <a href="/health/mirror">Mirror health</a>
        <a href="/test1">Test form</a>
    </div>
"#,
        rendered_at = escape_html(rendered_at),
        content = content,
    );
    layout("Mirrored Data", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NewRecord;
    use rocket::serde::json::json;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_my_data_page_escapes_records() {
        let records = vec![
            NewRecord::new("<b>bold</b>", json!({"k": "<v>"})).into_record(1),
            NewRecord::new("second", json!("text"))
                .with_description("about")
                .into_record(2),
        ];
        let page = my_data_page(&records, "2026-01-01 00:00:00");
        assert!(page.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!page.contains("<b>bold</b>"));
        assert!(page.contains("&lt;v&gt;"));
        assert!(page.contains(r#"<span id="totalCount">2</span>"#));
        assert!(page.contains("about"));
        assert!(page.contains("2026-01-01 00:00:00"));
    }

    #[test]
    fn test_my_data_page_empty() {
        let page = my_data_page(&[], "now");
        assert!(page.contains("No data found"));
        assert!(page.contains(r#"<span id="totalCount">0</span>"#));
    }

    #[test]
    fn test_url_data_page() {
        let record = NewRecord::new("URL Data #3", json!("hello"))
            .with_description("Data sent via URL at 2026-01-01 00:00:00")
            .into_record(3);
        let page = url_data_page(&record, 3);
        assert!(page.contains(r#""hello""#));
        assert!(page.contains("<strong>Assigned ID:</strong> 3"));
        assert!(page.contains("URL Data #3"));
    }

    #[test]
    fn test_mirror_page_error() {
        let error = MirrorError::Unavailable(String::from("<down>"));
        let page = mirror_page(Err(&error), "now");
        assert!(page.contains("Mirror unavailable"));
        assert!(page.contains("&lt;down&gt;"));
    }
}
