//! Tolerant parser for the Tarkka graph page.
//!
//! The page embeds its chart data as a JavaScript literal rather than JSON:
//!
//! ```text
//! $.plot($("#graafi"), [
//! { data: [[0,4.63]], highlightColor: '#529900', bars: { show: true, ... } },{ data: [[1,4.12]], ... }], options);
//! ```
//!
//! The line starting with `{ data:` is rewritten into JSON (bracket restored,
//! trailer dropped, bare keys quoted, single quotes swapped) and each entry's
//! price is read from `data[0][1]`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::FetchError;

static RE_BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z0-9]+):").expect("bare key pattern"));
static RE_LINE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]+").expect("line split pattern"));

const DATA_LINE_PREFIX: &str = "{ data:";
const DATA_LINE_TRAILER: &str = ", options);";

#[derive(Debug, Deserialize)]
struct GraphBar {
    data: Vec<Vec<f64>>,
}

/// Extract hourly prices, in hour order, from a graph page body.
pub fn parse_graph_body(body: &str) -> Result<Vec<f64>, FetchError> {
    if body.is_empty() {
        return Err(FetchError::Empty);
    }

    let line = RE_LINE_SPLIT
        .split(body)
        .map(str::trim)
        .find(|l| l.starts_with(DATA_LINE_PREFIX))
        .ok_or_else(|| FetchError::Parse(format!("no line starting with '{DATA_LINE_PREFIX}'")))?;

    let json = to_json_array(line);
    let bars: Vec<GraphBar> = serde_json::from_str(&json)
        .map_err(|e| FetchError::Parse(format!("chart data is not valid after rewrite: {e}")))?;

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            bar.data
                .first()
                .and_then(|point| point.get(1))
                .copied()
                .ok_or_else(|| FetchError::Parse(format!("entry {i} has no [hour, price] point")))
        })
        .collect()
}

fn to_json_array(line: &str) -> String {
    let body = line.replacen(DATA_LINE_TRAILER, "", 1);
    let quoted = RE_BARE_KEY.replace_all(&body, "\"$1\":");
    format!("[{}", quoted.replace('\'', "\""))
}
