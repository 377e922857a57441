//! Result templates shown to the user and stored in `result`.

use crate::diagnosis::DiagnosisKind;

pub const HEART_NO_RISK: &str = "Chúc mừng bạn không có nguy cơ mắc bệnh tim mạch";
pub const HEART_RISK: &str = "Bạn có nguy cơ cao mắc bệnh tim mạch, hãy đi khám ngay!";

pub const DEPRESSION_NO_RISK: &str = "Chúc mừng bạn không có nguy cơ trầm cảm";
pub const DEPRESSION_RISK: &str = "Bạn có nguy cơ trầm cảm, hãy đi gặp chuyên gia tâm lý!";

/// Weight categories indexed by obesity class id.
pub const OBESITY_CATEGORIES: [&str; 7] = [
    "Thiếu cân",
    "Cân nặng bình thường",
    "Thừa cân cấp độ I",
    "Thừa cân cấp độ II",
    "Béo phì loại I",
    "Béo phì loại II",
    "Béo phì loại III",
];

pub const UNDETERMINED: &str = "Kết quả không xác định";

/// Map a predicted class to its message. Binary models treat any
/// non-zero class as positive.
pub fn result_message(kind: DiagnosisKind, class_id: i64) -> &'static str {
    match kind {
        DiagnosisKind::Heart if class_id == 0 => HEART_NO_RISK,
        DiagnosisKind::Heart => HEART_RISK,
        DiagnosisKind::Depression if class_id == 0 => DEPRESSION_NO_RISK,
        DiagnosisKind::Depression => DEPRESSION_RISK,
        DiagnosisKind::Obesity => usize::try_from(class_id)
            .ok()
            .and_then(|i| OBESITY_CATEGORIES.get(i))
            .copied()
            .unwrap_or(UNDETERMINED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_models_compare_against_zero() {
        assert_eq!(result_message(DiagnosisKind::Heart, 0), HEART_NO_RISK);
        assert_eq!(result_message(DiagnosisKind::Heart, 1), HEART_RISK);
        assert_eq!(result_message(DiagnosisKind::Heart, -3), HEART_RISK);
        assert_eq!(result_message(DiagnosisKind::Depression, 0), DEPRESSION_NO_RISK);
        assert_eq!(result_message(DiagnosisKind::Depression, 2), DEPRESSION_RISK);
    }

    #[test]
    fn obesity_table() {
        assert_eq!(result_message(DiagnosisKind::Obesity, 0), "Thiếu cân");
        assert_eq!(result_message(DiagnosisKind::Obesity, 6), "Béo phì loại III");
    }

    #[test]
    fn obesity_out_of_table_is_undetermined() {
        assert_eq!(result_message(DiagnosisKind::Obesity, 7), UNDETERMINED);
        assert_eq!(result_message(DiagnosisKind::Obesity, -1), UNDETERMINED);
    }
}
