// ==========================================
// TAG 进度跟踪系统 - 界面文案
// ==========================================
// 职责: 语言切换、提示文案翻译、状态标签
// 词条: locales/zh-CN.yml, locales/en.yml
// 红线: 状态的对外词汇是 TagStatus 的序列化名，标签只用于展示
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::domain::types::TagStatus;

/// 默认语言
pub const DEFAULT_LOCALE: &str = "zh-CN";

/// 已提供词条的语言
pub const SUPPORTED_LOCALES: &[&str] = &["zh-CN", "en"];

/// 设置界面语言
///
/// # 返回
/// - true: 已切换
/// - false: 不支持该语言，回落到默认语言
pub fn set_locale(locale: &str) -> bool {
    let supported = SUPPORTED_LOCALES.contains(&locale);
    rust_i18n::set_locale(if supported { locale } else { DEFAULT_LOCALE });
    supported
}

/// 翻译提示文案
///
/// ```no_run
/// use tag_tracker::i18n::t;
/// let msg = t("common.success");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译带占位符 `%{name}` 的提示文案
///
/// ```no_run
/// use tag_tracker::i18n::t_with_args;
/// let msg = t_with_args("import.file_not_found", &[("path", "/tmp/e.csv")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(t(key), |text, (name, value)| {
        text.replace(&format!("%{{{}}}", name), value)
    })
}

/// 状态的展示标签（当前语言）
pub fn status_label(status: TagStatus) -> String {
    t(status.label_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // locale 是进程级全局状态，相关测试串行执行
    static LOCALE_LOCK: Mutex<()> = Mutex::new(());

    const ALL_STATUSES: [TagStatus; 7] = [
        TagStatus::AwaitingSchedule,
        TagStatus::Scheduled,
        TagStatus::Fabricated,
        TagStatus::Painted,
        TagStatus::Assembled,
        TagStatus::Torqued,
        TagStatus::Completed,
    ];

    #[test]
    fn test_unsupported_locale_falls_back() {
        let _guard = LOCALE_LOCK.lock().unwrap();
        assert!(set_locale("en"));
        assert_eq!(t("common.success"), "Operation successful");

        assert!(!set_locale("pt-BR"));
        assert_eq!(t("common.success"), "操作成功");
    }

    #[test]
    fn test_status_labels() {
        let _guard = LOCALE_LOCK.lock().unwrap();
        set_locale("zh-CN");
        assert_eq!(status_label(TagStatus::AwaitingSchedule), "待排程");
        assert_eq!(status_label(TagStatus::Torqued), "已紧固");

        set_locale("en");
        assert_eq!(status_label(TagStatus::Scheduled), "Scheduled");
        for status in ALL_STATUSES {
            // 缺词条时 rust-i18n 原样返回 key
            assert!(!status_label(status).contains(status.label_key()));
        }

        set_locale(DEFAULT_LOCALE);
    }

    #[test]
    fn test_import_message_placeholders() {
        let _guard = LOCALE_LOCK.lock().unwrap();
        set_locale("en");
        let msg = t_with_args(
            "import.completed",
            &[("matched", "3"), ("unmatched", "1"), ("skipped", "1")],
        );
        assert_eq!(
            msg,
            "Import finished: 3 rows matched, 1 unmatched, 1 skipped"
        );

        set_locale("zh-CN");
        let msg = t_with_args("import.file_not_found", &[("path", "/tmp/e.csv")]);
        assert!(msg.contains("/tmp/e.csv"));
        assert!(!msg.contains("%{path}"));
    }
}
