// ==========================================
// TAG 进度跟踪系统 - 命令行主入口
// ==========================================
// 输出约定: 命令结果以 JSON 写 stdout，日志与提示写 stderr
// ==========================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use tag_tracker::app::{get_default_db_path, AppState};
use tag_tracker::domain::record::{FieldPatch, NewTag};
use tag_tracker::domain::types::{AxisGranularity, DateClass, Discipline, TagField, TagStatus};
use tag_tracker::i18n::{set_locale, t, t_with_args};
use tag_tracker::logging::{self, LogFormat};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "tag-tracker", version, about = "TAG 进度跟踪系统")]
struct Cli {
    /// 数据库路径（默认: TAG_TRACKER_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 界面语言（zh-CN / en）
    #[arg(long, global = true, default_value = "zh-CN")]
    lang: String,

    /// 日志级别（覆盖 RUST_LOG）
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 初始化数据库
    Init,
    /// 登记新 TAG
    Register(RegisterArgs),
    /// 查看单个 TAG
    Show { discipline: Discipline, key: String },
    /// 列出 TAG
    List {
        discipline: Discipline,
        #[arg(long)]
        status: Option<TagStatus>,
    },
    /// 编辑 TAG 字段
    Edit(EditArgs),
    /// 删除 TAG
    Delete { discipline: Discipline, key: String },
    /// 导入批量更新文件（CSV / Excel）
    Import {
        #[arg(short, long)]
        discipline: Discipline,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// 生成 S 曲线
    Curve {
        /// 参与计算的专业（可重复，缺省为全部）
        #[arg(short, long = "discipline")]
        disciplines: Vec<Discipline>,
        /// 曲线口径（可重复，缺省读取配置）
        #[arg(short, long = "class")]
        classes: Vec<DateClass>,
        #[arg(short, long)]
        granularity: Option<AxisGranularity>,
    },
    /// 进度汇总
    Summary { discipline: Discipline },
    /// 状态漂移审计
    Audit {
        discipline: Discipline,
        /// 将派生状态写回
        #[arg(long)]
        repair: bool,
    },
    /// 导出记录集为 CSV
    Export {
        discipline: Discipline,
        #[arg(long)]
        title: Option<String>,
        /// 输出目录（默认当前目录）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// 项目周历换算
    Week {
        #[command(subcommand)]
        action: WeekAction,
    },
    /// 配置管理
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct RegisterArgs {
    discipline: Discipline,
    key: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    area: Option<String>,
    #[arg(long)]
    document: Option<String>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args)]
struct EditArgs {
    discipline: Discipline,
    key: String,
    /// 字段赋值 field=value（可重复）
    #[arg(long = "set", value_parser = parse_assignment)]
    assignments: Vec<(TagField, String)>,
    /// 清空字段（可重复）
    #[arg(long = "clear")]
    cleared: Vec<TagField>,
}

#[derive(Subcommand)]
enum WeekAction {
    /// 周次 → 周一至周五
    Range { week: i64 },
    /// 日期（dd/mm/yyyy）→ 周次
    Of { date: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// 显示全部配置
    Show,
    /// 写入配置项
    Set { key: String, value: String },
}

/// 解析 `field=value`
fn parse_assignment(raw: &str) -> Result<(TagField, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("格式应为 field=value: {}", raw))?;
    Ok((field.parse::<TagField>()?, value.to_string()))
}

fn build_patch(assignments: Vec<(TagField, String)>, cleared: Vec<TagField>) -> FieldPatch {
    let mut patch: FieldPatch = assignments
        .into_iter()
        .map(|(field, value)| (field, Some(value)))
        .collect();
    for field in cleared {
        patch.insert(field, None);
    }
    patch
}

fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    logging::init_with(format, cli.log_level.as_deref());
    if !set_locale(&cli.lang) {
        tracing::warn!(lang = %cli.lang, "不支持的语言，使用默认语言");
    }

    if let Err(e) = run(cli).await {
        eprintln!("{}: {}", t("common.failed"), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult {
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::debug!("使用数据库: {}", db_path);
    let state = AppState::new(db_path)?;
    let api = &state.tracker_api;

    match cli.command {
        Commands::Init => {
            eprintln!("{}: {}", t("common.success"), state.db_path);
        }
        Commands::Register(args) => {
            let new_tag = NewTag {
                key: args.key,
                description: args.description,
                area: args.area,
                reference_document: args.document,
                note: args.note,
            };
            print_json(&api.register_tag(args.discipline, new_tag).await?)?;
        }
        Commands::Show { discipline, key } => {
            print_json(&api.get_tag(discipline, &key).await?)?;
        }
        Commands::List { discipline, status } => {
            print_json(&api.list_tags(discipline, status).await?)?;
        }
        Commands::Edit(args) => {
            let patch = build_patch(args.assignments, args.cleared);
            print_json(&api.edit_tag(args.discipline, &args.key, patch).await?)?;
        }
        Commands::Delete { discipline, key } => {
            api.delete_tag(discipline, &key).await?;
            eprintln!("{}", t("common.success"));
        }
        Commands::Import { discipline, files } => {
            for file in files.iter().filter(|f| !f.exists()) {
                let path = file.display().to_string();
                eprintln!("{}", t_with_args("import.file_not_found", &[("path", &path)]));
            }
            let batch = files.into_iter().map(|f| (discipline, f)).collect();
            let results = api.import_batch(batch).await;

            let mut failed = 0;
            for result in &results {
                match result {
                    Ok(report) => eprintln!(
                        "{}",
                        t_with_args(
                            "import.completed",
                            &[
                                ("matched", &report.matched_count.to_string()),
                                ("unmatched", &report.unmatched_keys.len().to_string()),
                                ("skipped", &report.skipped_count.to_string()),
                            ],
                        )
                    ),
                    Err(e) => {
                        failed += 1;
                        eprintln!("{}", e);
                    }
                }
            }
            let reports: Vec<_> = results.into_iter().filter_map(Result::ok).collect();
            print_json(&reports)?;
            if failed > 0 {
                return Err(format!("{} 个文件导入失败", failed).into());
            }
        }
        Commands::Curve {
            disciplines,
            classes,
            granularity,
        } => {
            let classes = if classes.is_empty() { None } else { Some(classes) };
            let curve = api
                .build_progress_curve(&disciplines, classes, granularity)
                .await?;
            if curve.is_empty() {
                eprintln!("{}", t("curve.insufficient_data"));
            }
            print_json(&curve)?;
        }
        Commands::Summary { discipline } => {
            print_json(&api.progress_summary(discipline).await?)?;
        }
        Commands::Audit { discipline, repair } => {
            print_json(&api.audit_status(discipline, repair).await?)?;
        }
        Commands::Export {
            discipline,
            title,
            output,
        } => {
            let file = api.export_tags(discipline, title.as_deref()).await?;
            let target = output.unwrap_or_default().join(&file.file_name);
            std::fs::write(&target, &file.bytes)?;
            eprintln!("{}: {}", t("common.success"), target.display());
        }
        Commands::Week { action } => match action {
            WeekAction::Range { week } => print_json(&api.week_to_range(week).await?)?,
            WeekAction::Of { date } => print_json(&api.date_to_week(&date).await?)?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let snapshot = state
                    .config_manager
                    .get_config_snapshot()
                    .map_err(|e| e.to_string())?;
                println!("{}", snapshot);
            }
            ConfigAction::Set { key, value } => {
                state
                    .config_manager
                    .set_tracker_config(&key, &value)
                    .map_err(|e| e.to_string())?;
                eprintln!("{}", t("common.success"));
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tag_tracker::domain::types::DateField;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("actual_completion=03/10/2025").unwrap(),
            (
                TagField::Date(DateField::ActualCompletion),
                "03/10/2025".to_string()
            )
        );
        assert_eq!(
            parse_assignment("note=a=b").unwrap(),
            (TagField::Note, "a=b".to_string())
        );
        assert!(parse_assignment("note").is_err());
        assert!(parse_assignment("colour=red").is_err());
    }

    #[test]
    fn test_build_patch_clear_wins() {
        let patch = build_patch(
            vec![(TagField::Note, "x".to_string()), (TagField::Area, "A1".to_string())],
            vec![TagField::Note],
        );
        assert_eq!(patch.get(&TagField::Note), Some(&None));
        assert_eq!(patch.get(&TagField::Area), Some(&Some("A1".to_string())));
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from([
            "tag-tracker",
            "edit",
            "E",
            "E-101",
            "--set",
            "scheduled_start=01/10/2025",
            "--clear",
            "note",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Edit(_)));

        let cli = Cli::try_parse_from([
            "tag-tracker",
            "curve",
            "-d",
            "E",
            "-d",
            "S",
            "-c",
            "actual",
            "-g",
            "weekly",
        ])
        .unwrap();
        match cli.command {
            Commands::Curve {
                disciplines,
                classes,
                granularity,
            } => {
                assert_eq!(disciplines, vec![Discipline::Electrical, Discipline::Structural]);
                assert_eq!(classes, vec![DateClass::Actual]);
                assert_eq!(granularity, Some(AxisGranularity::Weekly));
            }
            _ => panic!("Expected Curve"),
        }

        assert!(Cli::try_parse_from(["tag-tracker", "import", "-d", "E"]).is_err());
    }
}
