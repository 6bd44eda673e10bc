use crate::layout::Layout;

pub(crate) fn render(layout: &Layout) -> String {
    let separator = Layout::separator();
    format!(
        "{heading}\n{separator}\n\n{generated_on}\n{tone}\n{separator}\n\n{body}\n\n{rule}\n{footer}\n",
        heading = layout.heading,
        generated_on = layout.generated_on,
        tone = layout.tone,
        body = layout.body,
        rule = "-".repeat(separator.len()),
        footer = layout.footer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_embedded_verbatim() {
        let layout = Layout {
            heading: "TUM Announcement".into(),
            generated_on: "Generated on: 2025-01-01 10:00".into(),
            tone: "Tone: Friendly".into(),
            body: "Dear all,\n\n  indented line\nKind regards".into(),
            footer: "Campus Heilbronn".into(),
        };
        let text = render(&layout);

        assert!(text.starts_with("TUM Announcement\n=================================================="));
        assert!(text.contains("Dear all,\n\n  indented line\nKind regards"));
        assert!(text.trim_end().ends_with("Campus Heilbronn"));
    }
}
