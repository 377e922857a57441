//! Field definitions for the three diagnosis forms.
//!
//! Choice options carry their model code explicitly. The persisted form
//! of a choice is `"Label (code)"`, which is what older records in the
//! store already contain.

use serde::Serialize;

/// One option of a choice field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub code: i64,
    pub label: &'static str,
}

impl Choice {
    pub const fn new(code: i64, label: &'static str) -> Self {
        Self { code, label }
    }

    /// Text persisted in the record's `inputs`.
    pub fn display(&self) -> String {
        format!("{} ({})", self.label, self.code)
    }
}

/// Value domain of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Integer { min: i64, max: Option<i64> },
    Decimal { min: f64, max: Option<f64> },
    Choice { options: &'static [Choice] },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn integer(name: &'static str, label: &'static str, min: i64, max: Option<i64>) -> Self {
        Self { name, label, kind: FieldKind::Integer { min, max } }
    }

    const fn decimal(name: &'static str, label: &'static str, min: f64, max: Option<f64>) -> Self {
        Self { name, label, kind: FieldKind::Decimal { min, max } }
    }

    const fn choice(name: &'static str, label: &'static str, options: &'static [Choice]) -> Self {
        Self { name, label, kind: FieldKind::Choice { options } }
    }

    /// Find the option whose persisted text equals `display`.
    pub fn option_by_display(&self, display: &str) -> Option<Choice> {
        match self.kind {
            FieldKind::Choice { options } => options.iter().copied().find(|c| c.display() == display),
            _ => None,
        }
    }
}

// Heart flow encodes male as 0; the other two flows encode male as 1.
const HEART_GENDER: &[Choice] = &[Choice::new(0, "Nam"), Choice::new(1, "Nữ")];
const MALE_IS_ONE: &[Choice] = &[Choice::new(1, "Nam"), Choice::new(0, "Nữ")];

const CHEST_PAIN: &[Choice] = &[
    Choice::new(1, "Typical angina"),
    Choice::new(0, "Asymptomatic"),
    Choice::new(3, "Non-anginal pain"),
    Choice::new(2, "Atypical angina"),
];

const THALASSEMIA: &[Choice] = &[
    Choice::new(3, "Bình thường"),
    Choice::new(6, "Khiếm khuyết cố định"),
    Choice::new(7, "Khuyết có thể đảo ngược"),
];

const SLEEP: &[Choice] = &[
    Choice::new(1, "Dưới 5 giờ"),
    Choice::new(2, "5-6 giờ"),
    Choice::new(3, "7-8 giờ"),
    Choice::new(4, "Trên 8 giờ"),
];

const DIET: &[Choice] = &[
    Choice::new(1, "Không lành mạnh"),
    Choice::new(2, "Trung bình"),
    Choice::new(3, "Lành mạnh"),
];

const NO_YES_VI: &[Choice] = &[Choice::new(0, "Không"), Choice::new(1, "Có")];
const YES_NO: &[Choice] = &[Choice::new(1, "Yes"), Choice::new(0, "No")];

const VEG_INTAKE: &[Choice] = &[
    Choice::new(0, "Ăn ít"),
    Choice::new(1, "Ăn đủ"),
    Choice::new(2, "Ăn nhiều"),
];

const MEALS_PER_DAY: &[Choice] = &[
    Choice::new(1, "1"),
    Choice::new(2, "2"),
    Choice::new(3, "3"),
    Choice::new(4, "4+"),
];

const FREQUENCY: &[Choice] = &[
    Choice::new(0, "Không"),
    Choice::new(1, "Thi thoảng"),
    Choice::new(2, "Thường xuyên"),
    Choice::new(3, "Luôn"),
];

const ACTIVITY: &[Choice] = &[
    Choice::new(0, "Không"),
    Choice::new(1, "Thấp"),
    Choice::new(2, "Bình thường"),
    Choice::new(3, "Cao"),
];

const DEVICE_TIME: &[Choice] = &[
    Choice::new(0, "Thấp"),
    Choice::new(1, "Trung bình"),
    Choice::new(2, "Cao"),
];

const TRANSPORT: &[Choice] = &[
    Choice::new(0, "Public"),
    Choice::new(1, "Automobile"),
    Choice::new(2, "Walking"),
    Choice::new(3, "Motorbike"),
    Choice::new(4, "Bike"),
];

pub const HEART_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer("age", "Tuổi", 1, None),
    FieldSpec::choice("gender", "Giới tính", HEART_GENDER),
    FieldSpec::choice("chest_pain", "Đau ngực", CHEST_PAIN),
    FieldSpec::integer("blood_pressure", "Huyết áp", 1, None),
    FieldSpec::integer("cholesterol", "Cholesterol", 1, None),
    FieldSpec::integer("heartbeat", "Nhịp tim", 1, None),
    FieldSpec::choice("thalassemia", "Thalassemia", THALASSEMIA),
];

pub const DEPRESSION_FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("gender", "Giới tính", MALE_IS_ONE),
    FieldSpec::integer("age", "Tuổi", 1, None),
    FieldSpec::integer("study_pressure", "Áp lực học tập (0-5)", 0, Some(5)),
    FieldSpec::decimal("cgpa", "Điểm trung bình (0.0-10.0)", 0.0, Some(10.0)),
    FieldSpec::integer("satisfaction", "Mức độ hài lòng (0-5)", 0, Some(5)),
    FieldSpec::choice("sleep", "Giờ ngủ", SLEEP),
    FieldSpec::choice("diet", "Thói quen ăn uống", DIET),
    FieldSpec::choice("suicide_thoughts", "Từng nghĩ tự tử?", NO_YES_VI),
    FieldSpec::integer("study_hours", "Giờ học/ngày", 1, None),
    FieldSpec::integer("financial_pressure", "Áp lực tài chính (0-5)", 0, Some(5)),
    FieldSpec::choice("family_history", "Tiền sử bệnh tâm thần gia đình", NO_YES_VI),
];

pub const OBESITY_FIELDS: &[FieldSpec] = &[
    FieldSpec::choice("gender", "Giới tính", MALE_IS_ONE),
    FieldSpec::integer("age", "Tuổi", 1, None),
    FieldSpec::decimal("height", "Chiều cao (m)", 0.5, Some(2.5)),
    FieldSpec::decimal("weight", "Cân nặng (kg)", 1.0, None),
    FieldSpec::choice("family_history", "Gia đình có thừa cân?", YES_NO),
    FieldSpec::choice("caloric_food", "Tiêu thụ thực phẩm giàu calo?", YES_NO),
    FieldSpec::choice("veg_intake", "Ăn rau", VEG_INTAKE),
    FieldSpec::choice("meals_per_day", "Số bữa chính/ngày", MEALS_PER_DAY),
    FieldSpec::choice("snacking", "Ăn vặt", FREQUENCY),
    FieldSpec::choice("smoking", "Hút thuốc?", YES_NO),
    FieldSpec::decimal("water_liter", "Nước uống (lít)", 0.1, None),
    FieldSpec::choice("track_calories", "Theo dõi calo?", YES_NO),
    FieldSpec::choice("activity", "Hoạt động thể chất", ACTIVITY),
    FieldSpec::choice("device_time", "Giờ dùng thiết bị", DEVICE_TIME),
    FieldSpec::choice("alcohol", "Tiêu thụ rượu", FREQUENCY),
    FieldSpec::choice("transport", "Phương tiện chính", TRANSPORT),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn choice_display_embeds_code() {
        assert_eq!(Choice::new(1, "Typical angina").display(), "Typical angina (1)");
        assert_eq!(Choice::new(4, "4+").display(), "4+ (4)");
    }

    #[test]
    fn field_names_unique_per_form() {
        for fields in [HEART_FIELDS, DEPRESSION_FIELDS, OBESITY_FIELDS] {
            let names: HashSet<_> = fields.iter().map(|f| f.name).collect();
            assert_eq!(names.len(), fields.len());
        }
    }

    #[test]
    fn option_codes_unique_per_field() {
        for fields in [HEART_FIELDS, DEPRESSION_FIELDS, OBESITY_FIELDS] {
            for field in fields {
                if let FieldKind::Choice { options } = field.kind {
                    let codes: HashSet<_> = options.iter().map(|c| c.code).collect();
                    assert_eq!(codes.len(), options.len(), "duplicate code in {}", field.name);
                }
            }
        }
    }

    #[test]
    fn option_lookup_by_display_text() {
        let thal = HEART_FIELDS.iter().find(|f| f.name == "thalassemia").unwrap();
        assert_eq!(thal.option_by_display("Khiếm khuyết cố định (6)").unwrap().code, 6);
        assert!(thal.option_by_display("Khiếm khuyết cố định (5)").is_none());
        let age = HEART_FIELDS.iter().find(|f| f.name == "age").unwrap();
        assert!(age.option_by_display("45").is_none());
    }

    #[test]
    fn schema_serializes_with_type_tag() {
        let json = serde_json::to_value(&HEART_FIELDS[1]).unwrap();
        assert_eq!(json["name"], "gender");
        assert_eq!(json["type"], "choice");
        assert_eq!(json["options"][0]["label"], "Nam");
        assert_eq!(json["options"][0]["code"], 0);
    }
}
