// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of a finished trace into report lines.

use crate::TimeUnit;
use crate::context::{ThreadTraceContext, TraceItem};

/// Line emitted instead of the start/end markers when a context has no items.
pub const NO_TRACKER_MESSAGE: &str = "There isn't any tracker enabled in the tracking context";

const INDENT_UNIT: &str = "  ";
const BRANCH_MARKER: &str = "|-- ";

/**
Renders a completed [`ThreadTraceContext`] as an indented tree.

Items that finished under their threshold are hidden together with their whole
subtree, and items at or over their threshold are annotated:

```text
Trace context id: 3f0c... | Trace timestamp: 2024-05-01T09:30:12.041Z
{===== Start of trace context id: 3f0c... =====}
handle_request - 250 ms ¤ [Threshold Exceed !!: 200 ms]
  |-- load_user - Args: [id=7] - 180 ms
{====== End of trace context id: 3f0c... ======}
```

If hiding leaves nothing to show, the body collapses to a single summary line
with the count, min, max and total of all items.
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceFormatter;

impl TraceFormatter {
    pub fn new() -> Self {
        TraceFormatter
    }

    pub fn render(&self, ctx: &ThreadTraceContext) -> Vec<String> {
        let id = ctx.trace_id();
        let mut lines = vec![format!(
            "Trace context id: {id} | Trace timestamp: {}",
            ctx.created_at().format("%Y-%m-%dT%H:%M:%S%.3fZ")
        )];
        let items = ctx.items();
        if items.is_empty() {
            lines.push(NO_TRACKER_MESSAGE.to_string());
            return lines;
        }

        lines.push(format!("{{===== Start of trace context id: {id} =====}}"));
        let before = lines.len();
        for (item, suppressed) in items.iter().zip(suppressed_mask(items)) {
            if !suppressed {
                lines.push(render_item(item));
            }
        }
        if lines.len() == before {
            lines.push(summary_line(items));
        }
        lines.push(format!("{{====== End of trace context id: {id} ======}}"));
        lines
    }
}

/// Which items are hidden, in sequence order.
///
/// An item finished under its threshold opens a zone; it and every following
/// deeper item are hidden until an item at the same depth or shallower shows
/// up, which closes the zone and is then judged on its own.
pub fn suppressed_mask(items: &[TraceItem]) -> Vec<bool> {
    let mut zone: Option<usize> = None;
    items
        .iter()
        .map(|item| {
            if zone.is_some_and(|depth| item.depth() <= depth) {
                zone = None;
            }
            if zone.is_none() && item.is_within_threshold() {
                zone = Some(item.depth());
            }
            zone.is_some()
        })
        .collect()
}

fn indent(depth: usize) -> String {
    if depth == 0 {
        String::new()
    } else {
        format!("{}{BRANCH_MARKER}", INDENT_UNIT.repeat(depth))
    }
}

fn render_item(item: &TraceItem) -> String {
    let mut line = indent(item.depth());
    line.push_str(item.label());
    if let Some(arguments) = item.arguments() {
        line.push_str(&format!(" - Args: [{arguments}]"));
    }
    match item.measurement() {
        Some(m) => {
            line.push_str(&format!(" - {} {}", m.value, m.unit));
            if let Some(threshold) = item.threshold().filter(|_| item.exceeds_threshold()) {
                line.push_str(&format!(" ¤ [Threshold Exceed !!: {threshold} {}]", m.unit));
            }
        }
        None => line.push_str(" - unfinished"),
    }
    line
}

fn summary_line(items: &[TraceItem]) -> String {
    // Mixed units are normalised to the finest one present.
    let unit = items
        .iter()
        .filter_map(TraceItem::unit)
        .max()
        .unwrap_or_default();
    let values: Vec<u64> = items
        .iter()
        .filter_map(TraceItem::measurement)
        .map(|m| m.unit.convert_value(m.value, unit))
        .collect();
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    let total = values.iter().fold(0u64, |acc, v| acc.saturating_add(*v));
    format!(
        "All {} tracked items are within their thresholds (min: {min} {unit}, max: {max} {unit}, total: {total} {unit})",
        items.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn finished(items: &[(&str, usize, u64, Option<u64>)]) -> ThreadTraceContext {
        // Replays a pre-order listing through begin/end.
        let mut ctx = ThreadTraceContext::new();
        let mut open: Vec<(crate::context::ItemHandle, usize, u64)> = Vec::new();
        for &(label, depth, duration, threshold) in items {
            while open.len() > depth {
                let (handle, _, d) = open.pop().unwrap();
                ctx.end(handle, d, TimeUnit::Millis).unwrap();
            }
            let handle = ctx.begin(label, None, threshold).unwrap();
            open.push((handle, depth, duration));
        }
        while let Some((handle, _, d)) = open.pop() {
            ctx.end(handle, d, TimeUnit::Millis).unwrap();
        }
        ctx
    }

    fn body(lines: &[String]) -> &[String] {
        &lines[2..lines.len() - 1]
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn nested_tree() {
        let ctx = finished(&[("a", 0, 120, None), ("b", 1, 50, None)]);
        let lines = TraceFormatter::new().render(&ctx);
        let id = ctx.trace_id().to_string();
        assert!(lines[0].starts_with(&format!("Trace context id: {id} | Trace timestamp: ")));
        assert_eq!(lines[1], format!("{{===== Start of trace context id: {id} =====}}"));
        assert_eq!(body(&lines), ["a - 120 ms", "  |-- b - 50 ms"]);
        assert_eq!(lines[4], format!("{{====== End of trace context id: {id} ======}}"));
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn slow_item_is_annotated() {
        let ctx = finished(&[("slow", 0, 250, Some(200))]);
        let lines = TraceFormatter::new().render(&ctx);
        assert_eq!(body(&lines), ["slow - 250 ms ¤ [Threshold Exceed !!: 200 ms]"]);

        let ctx = finished(&[("edge", 0, 200, Some(200))]);
        let lines = TraceFormatter::new().render(&ctx);
        assert_eq!(body(&lines), ["edge - 200 ms ¤ [Threshold Exceed !!: 200 ms]"]);
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn fast_sibling_is_hidden_alone() {
        let ctx = finished(&[
            ("root", 0, 400, None),
            ("fast", 1, 50, Some(200)),
            ("inner", 2, 40, None),
            ("also-fast", 1, 30, None),
        ]);
        let lines = TraceFormatter::new().render(&ctx);
        assert_eq!(
            body(&lines),
            ["root - 400 ms", "  |-- also-fast - 30 ms"]
        );
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn zone_reopens_at_same_depth() {
        let ctx = finished(&[
            ("root", 0, 400, None),
            ("fast", 1, 50, Some(200)),
            ("fast-again", 1, 10, Some(20)),
            ("hidden", 2, 5, None),
            ("slow", 1, 300, Some(200)),
        ]);
        let lines = TraceFormatter::new().render(&ctx);
        assert_eq!(
            body(&lines),
            [
                "root - 400 ms",
                "  |-- slow - 300 ms ¤ [Threshold Exceed !!: 200 ms]"
            ]
        );
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn everything_fast_collapses_to_summary() {
        let ctx = finished(&[
            ("root", 0, 90, Some(100)),
            ("one", 1, 20, Some(50)),
            ("two", 1, 30, Some(50)),
        ]);
        let lines = TraceFormatter::new().render(&ctx);
        assert_eq!(
            body(&lines),
            ["All 3 tracked items are within their thresholds (min: 20 ms, max: 90 ms, total: 140 ms)"]
        );
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn summary_uses_finest_unit() {
        let mut ctx = ThreadTraceContext::new();
        let root = ctx.begin("root", None, Some(2)).unwrap();
        let child = ctx.begin("child", None, Some(900)).unwrap();
        ctx.end(child, 750, TimeUnit::Micros).unwrap();
        ctx.end(root, 1, TimeUnit::Seconds).unwrap();
        let lines = TraceFormatter::new().render(&ctx);
        assert_eq!(
            body(&lines),
            ["All 2 tracked items are within their thresholds (min: 750 µs, max: 1000000 µs, total: 1000750 µs)"]
        );
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn arguments_are_rendered() {
        let mut ctx = ThreadTraceContext::new();
        let h = ctx
            .begin("find(id: u32)", Some("id=7".to_string()), None)
            .unwrap();
        ctx.end(h, 3, TimeUnit::Micros).unwrap();
        let lines = TraceFormatter::new().render(&ctx);
        assert_eq!(body(&lines), ["find(id: u32) - Args: [id=7] - 3 µs"]);
    }

    #[cfg_attr(not(target_arch = "wasm32"), test)]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test::wasm_bindgen_test)]
    fn empty_context() {
        let ctx = ThreadTraceContext::new();
        let lines = TraceFormatter::new().render(&ctx);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], NO_TRACKER_MESSAGE);
    }

    fn arbitrary_items() -> impl Strategy<Value = Vec<(usize, u64, Option<u64>)>> {
        // Depth steps of at most +1 keep the listing a valid pre-order walk.
        prop::collection::vec((0usize..3, 0u64..100, prop::option::of(0u64..100)), 1..40)
            .prop_map(|raw| {
                let mut depth = 0usize;
                raw.into_iter()
                    .enumerate()
                    .map(|(n, (step, duration, threshold))| {
                        if n > 0 {
                            depth = match step {
                                0 => depth + 1,
                                1 => depth,
                                _ => depth.saturating_sub(1),
                            };
                        }
                        (depth, duration, threshold)
                    })
                    .collect()
            })
    }

    proptest! {
        #[test]
        fn prop_suppression_covers_whole_subtree(raw in arbitrary_items()) {
            let labels: Vec<String> = (0..raw.len()).map(|n| format!("op{n}")).collect();
            let listing: Vec<(&str, usize, u64, Option<u64>)> = raw
                .iter()
                .zip(&labels)
                .map(|(&(depth, duration, threshold), label)| (label.as_str(), depth, duration, threshold))
                .collect();
            let ctx = finished(&listing);
            let items = ctx.items();
            let mask = suppressed_mask(items);

            for (i, item) in items.iter().enumerate() {
                if !item.is_within_threshold() {
                    continue;
                }
                prop_assert!(mask[i]);
                for (j, later) in items.iter().enumerate().skip(i + 1) {
                    if later.depth() <= item.depth() {
                        break;
                    }
                    prop_assert!(mask[j], "item {} under {} should be hidden", j, i);
                }
            }

            let visible = mask.iter().filter(|hidden| !**hidden).count();
            let lines = TraceFormatter::new().render(&ctx);
            if visible == 0 {
                prop_assert_eq!(lines.len(), 4);
                prop_assert!(lines[2].starts_with("All "));
            } else {
                prop_assert_eq!(lines.len(), visible + 3);
            }
        }
    }
}
