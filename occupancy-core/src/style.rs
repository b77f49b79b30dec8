//! Visual treatment of stay bars by status.

use serde::Serialize;

use crate::StayStatus;

/// Fill, border and opacity for a bar on the timeline.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct BarStyle {
    pub background: &'static str,
    pub border: Option<&'static str>,
    pub opacity: f32,
    /// Extra class for bars that need more than CSS variables.
    pub class: Option<&'static str>,
}

const ACTIVE: BarStyle = BarStyle {
    background: "#e3d8f6",
    border: None,
    opacity: 1.0,
    class: None,
};

const PLANNED: BarStyle = BarStyle {
    background: "transparent",
    border: Some("2px dashed #bdaee2"),
    opacity: 1.0,
    class: None,
};

const PAUSED: BarStyle = BarStyle {
    background: "#f2f2f2",
    border: None,
    opacity: 0.5,
    class: None,
};

const RESERVED: BarStyle = BarStyle {
    background: "repeating-linear-gradient(135deg, #e9e6f5 0px, #e9e6f5 8px, #d0cbe9 8px, #d0cbe9 16px)",
    border: Some("1.5px solid #bdb6d6"),
    opacity: 1.0,
    class: Some("reserved-bar"),
};

const FALLBACK: BarStyle = BarStyle {
    background: "#cccccc",
    border: None,
    opacity: 0.7,
    class: None,
};

pub fn bar_style(status: StayStatus) -> BarStyle {
    match status {
        StayStatus::Active => ACTIVE,
        StayStatus::Planned => PLANNED,
        StayStatus::Paused => PAUSED,
        StayStatus::Reserved => RESERVED,
        StayStatus::Unknown => FALLBACK,
    }
}

impl BarStyle {
    /// Inline custom properties consumed by the bar stylesheet.
    pub fn css_vars(&self) -> String {
        format!(
            "--patient-bg: {}; --patient-border: {}; --patient-opacity: {}",
            self.background,
            self.border.unwrap_or("none"),
            self.opacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_have_distinct_styles() {
        let styles = [
            bar_style(StayStatus::Active),
            bar_style(StayStatus::Planned),
            bar_style(StayStatus::Paused),
            bar_style(StayStatus::Reserved),
        ];
        for (i, a) in styles.iter().enumerate() {
            for b in &styles[i + 1..] {
                assert_ne!(a, b);
            }
            assert_ne!(*a, FALLBACK);
        }
    }

    #[test]
    fn unknown_status_uses_fallback() {
        let style = bar_style(StayStatus::Unknown);
        assert_eq!(style.background, "#cccccc");
        assert_eq!(
            style.css_vars(),
            "--patient-bg: #cccccc; --patient-border: none; --patient-opacity: 0.7"
        );
    }
}
