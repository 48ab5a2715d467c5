//! 引导过程中收集到的线索信息，以及由此推导出的阶段进度
//!
//! 进度按引导顺序计算：目标国家 → 销售渠道 → 电话 → 竞争对手 → 预约演示，
//! 遇到第一个缺失项即停止（例如只有电话没有国家，仍处于 INITIAL/0）。

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::IntakeError;
use crate::phase::Phase;

static PHONE_RE: OnceLock<Regex> = OnceLock::new();

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedInfo {
    pub target_country: Option<String>,
    pub sales_channels: Vec<String>,
    /// 规范化后的号码：可选的 `+` 加纯数字
    pub phone: Option<String>,
    pub competitors: Vec<String>,
    pub demo_requested: bool,
}

impl CollectedInfo {
    pub fn set_target_country(&mut self, country: &str) -> Result<(), IntakeError> {
        self.target_country = Some(non_blank("target_country", country)?);
        Ok(())
    }

    /// 逗号分隔的渠道列表，追加且去重
    pub fn add_sales_channels(&mut self, raw: &str) -> Result<(), IntakeError> {
        let items = split_list("sales_channels", raw)?;
        merge_unique(&mut self.sales_channels, items);
        Ok(())
    }

    pub fn set_phone(&mut self, raw: &str) -> Result<(), IntakeError> {
        self.phone = Some(normalize_phone(raw)?);
        Ok(())
    }

    pub fn add_competitors(&mut self, raw: &str) -> Result<(), IntakeError> {
        let items = split_list("competitors", raw)?;
        merge_unique(&mut self.competitors, items);
        Ok(())
    }

    pub fn request_demo(&mut self) {
        self.demo_requested = true;
    }

    /// 按引导顺序已完成的阶段（连续前缀）
    fn completed_steps(&self) -> [bool; 5] {
        [
            self.target_country.is_some(),
            !self.sales_channels.is_empty(),
            self.phone.is_some(),
            !self.competitors.is_empty(),
            self.demo_requested,
        ]
    }

    /// 当前达到的阶段与粗粒度完成百分比
    pub fn progress(&self) -> (Phase, i32) {
        let reached = self
            .completed_steps()
            .iter()
            .take_while(|done| **done)
            .count();
        // Phase::ALL[0] 是 INITIAL，之后依次对应五个里程碑
        let phase = Phase::ALL[reached];
        (phase, phase.milestone_percentage())
    }

    /// 已填写的字段数（不要求连续）
    pub fn completed_fields(&self) -> usize {
        self.completed_steps().iter().filter(|done| **done).count()
    }
}

fn non_blank(field: &'static str, value: &str) -> Result<String, IntakeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::invalid_field(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

fn split_list(field: &'static str, raw: &str) -> Result<Vec<String>, IntakeError> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        return Err(IntakeError::invalid_field(field, "no entries given"));
    }
    Ok(items)
}

fn merge_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.iter().any(|t| t.eq_ignore_ascii_case(&item)) {
            target.push(item);
        }
    }
}

/// 去掉空格、短横线、点和括号后校验：可选 `+`，7-15 位数字
pub fn normalize_phone(raw: &str) -> Result<String, IntakeError> {
    let re = PHONE_RE.get_or_init(|| Regex::new(r"^\+?[0-9]{7,15}$").unwrap());
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(*c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    if !re.is_match(&compact) {
        return Err(IntakeError::invalid_field(
            "phone",
            format!("'{}' is not a valid phone number", raw.trim()),
        ));
    }
    Ok(compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_follows_order() {
        let mut info = CollectedInfo::default();
        assert_eq!(info.progress(), (Phase::Initial, 0));

        info.set_target_country("Germany").unwrap();
        assert_eq!(info.progress(), (Phase::Country, 20));

        info.add_sales_channels("Amazon, distributors").unwrap();
        assert_eq!(info.progress(), (Phase::SalesChannels, 40));

        info.set_phone("+49 (30) 123-4567").unwrap();
        assert_eq!(info.progress(), (Phase::Phone, 60));

        info.add_competitors("Acme").unwrap();
        assert_eq!(info.progress(), (Phase::Competitors, 80));

        info.request_demo();
        assert_eq!(info.progress(), (Phase::Demo, 100));
        assert_eq!(info.completed_fields(), 5);
    }

    #[test]
    fn test_gap_stops_progress() {
        let mut info = CollectedInfo::default();
        info.set_phone("0123456789").unwrap();
        info.request_demo();
        assert_eq!(info.progress(), (Phase::Initial, 0));
        assert_eq!(info.completed_fields(), 2);
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_phone(" +1 (555) 010-9999 ").unwrap(), "+15550109999");
        assert_eq!(normalize_phone("030.1234.5678").unwrap(), "03012345678");
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("call me maybe").is_err());
        assert!(normalize_phone("++4912345678").is_err());
    }

    #[test]
    fn test_blank_inputs_rejected() {
        let mut info = CollectedInfo::default();
        assert!(matches!(
            info.set_target_country("   "),
            Err(IntakeError::InvalidField { field: "target_country", .. })
        ));
        assert!(info.add_sales_channels(" , ,").is_err());
        assert!(info.target_country.is_none());
    }

    #[test]
    fn test_lists_merge_unique() {
        let mut info = CollectedInfo::default();
        info.add_competitors("Acme, Globex").unwrap();
        info.add_competitors("acme, Initech").unwrap();
        assert_eq!(info.competitors, vec!["Acme", "Globex", "Initech"]);
    }
}
