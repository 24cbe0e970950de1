//! # repairdoc CLI
//!
//! Usage:
//!   repairdoc render work.json -o 보수확인서.pdf
//!   repairdoc example > work.json
//!   repairdoc contracts --center 서울
//!   repairdoc payments --contract-id 7 --page 2
//!   repairdoc payment-detail 31

use std::fs;
use std::path::{Path, PathBuf};

use clap::{value_parser, Arg, ArgMatches, Command};
use serde::Serialize;

use repairdoc::api::{paginate_list, ApiClient};
use repairdoc::config::AppConfig;
use repairdoc::font::FontContext;
use repairdoc::format::format_number;
use repairdoc::{RepairDocError, DEFAULT_FILE_NAME};

/// The default labels are Korean; the standard PDF fonts cannot draw them.
const FONTS_HELP: &str = "\
Labels and titles are Korean by default. The built-in PDF fonts only cover
Latin text, so configure a TrueType font with Hangul glyphs in the config
file, for example:

  { \"render\": { \"fontFamily\": \"NanumGothic\",
      \"fonts\": [ { \"family\": \"NanumGothic\", \"path\": \"/usr/share/fonts/NanumGothic.ttf\" } ] } }";

fn cli() -> Command {
    let page_args = [
        Arg::new("page")
            .long("page")
            .value_name("N")
            .help("Page to show, 1-based")
            .value_parser(value_parser!(usize))
            .default_value("1"),
        Arg::new("per-page")
            .long("per-page")
            .value_name("N")
            .help("Items per page")
            .value_parser(value_parser!(usize))
            .default_value("10"),
    ];

    Command::new("repairdoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Repair confirmation generator and payment data browser")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file path")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .subcommand(
            Command::new("render")
                .about("Render a work-order JSON document to PDF")
                .after_help(FONTS_HELP)
                .arg(
                    Arg::new("input")
                        .value_name("INPUT")
                        .help("Document JSON file")
                        .value_parser(value_parser!(PathBuf))
                        .required(true),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("FILE")
                        .help("Output PDF path")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("rows-per-page")
                        .long("rows-per-page")
                        .value_name("N")
                        .help("Table rows per page, padding included")
                        .value_parser(value_parser!(usize)),
                ),
        )
        .subcommand(Command::new("example").about("Print a sample document JSON"))
        .subcommand(
            Command::new("contracts")
                .about("List contracts")
                .arg(
                    Arg::new("center")
                        .long("center")
                        .value_name("CENTER")
                        .help("Only contracts of this center"),
                )
                .args(page_args.clone()),
        )
        .subcommand(
            Command::new("payments")
                .about("List payment rounds of a contract")
                .arg(
                    Arg::new("contract-id")
                        .long("contract-id")
                        .value_name("ID")
                        .help("Contract to list payment rounds for")
                        .value_parser(value_parser!(i64)),
                )
                .args(page_args),
        )
        .subcommand(
            Command::new("payment-detail")
                .about("Show the work orders of a payment round")
                .arg(
                    Arg::new("id")
                        .value_name("ID")
                        .value_parser(value_parser!(i64))
                        .required(true),
                ),
        )
}

#[tokio::main]
async fn main() {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = cli().get_matches();
    if let Err(e) = run(&matches).await {
        eprintln!("✗ {e}");
        if !e.hint().is_empty() {
            eprintln!("  hint: {}", e.hint());
        }
        std::process::exit(1);
    }
}

async fn run(matches: &ArgMatches) -> repairdoc::Result<()> {
    let config_path = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);

    match matches.subcommand() {
        Some(("example", _)) => {
            print!("{}", example_document_json());
            Ok(())
        }
        Some(("render", sub)) => render(sub, AppConfig::load(config_path)?),
        Some((name, sub)) => {
            let config = AppConfig::load(config_path)?;
            let client = ApiClient::new(&config.api)?;
            match name {
                "contracts" => {
                    let (page, per_page) = page_selection(sub);
                    let center = sub.get_one::<String>("center").map(String::as_str);
                    let contracts = client.contracts(center).await?;
                    print_json(&paginate_list(contracts, page, per_page))
                }
                "payments" => {
                    let (page, per_page) = page_selection(sub);
                    let contract_id = sub.get_one::<i64>("contract-id").copied();
                    let rounds = client.payments(contract_id).await?;
                    print_json(&paginate_list(rounds, page, per_page))
                }
                "payment-detail" => {
                    let id = sub
                        .get_one::<i64>("id")
                        .copied()
                        .ok_or(RepairDocError::MissingParameter("id"))?;
                    let details = client.payment_detail(id).await?;
                    for d in &details {
                        println!(
                            "{}\t{}\t재료비 {}\t노무비 {}\t경비 {}\t합계 {}",
                            d.order_number,
                            d.order_date,
                            format_number(d.material_cost),
                            format_number(d.labor_cost),
                            format_number(d.expense_cost),
                            format_number(d.total_cost),
                        );
                    }
                    Ok(())
                }
                _ => unreachable!("subcommand_required"),
            }
        }
        None => unreachable!("subcommand_required"),
    }
}

fn render(sub: &ArgMatches, mut config: AppConfig) -> repairdoc::Result<()> {
    let input = sub
        .get_one::<PathBuf>("input")
        .ok_or(RepairDocError::MissingParameter("input"))?;
    let output = sub
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME));
    if let Some(rows) = sub.get_one::<usize>("rows-per-page") {
        config.render.rows_per_page = *rows;
    }

    if config.render.fonts.is_empty() {
        log::warn!("no TrueType font configured under render.fonts; Korean text will print as '?'");
    }

    let json = fs::read_to_string(input)?;
    let fonts = FontContext::from_entries(&config.render.fonts)?;
    let pdf_bytes = repairdoc::render_json(&json, &config.render, &fonts)?;
    write_output(&output, &pdf_bytes)
}

fn write_output(path: &Path, bytes: &[u8]) -> repairdoc::Result<()> {
    fs::write(path, bytes)?;
    log::info!("✓ Written {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// `--page` / `--per-page`, defaulting when the subcommand has no paging.
fn page_selection(sub: &ArgMatches) -> (usize, usize) {
    let arg = |id: &str, default: usize| {
        sub.try_get_one::<usize>(id)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(default)
    };
    (arg("page", 1), arg("per-page", 10))
}

fn print_json<T: Serialize>(value: &T) -> repairdoc::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn example_document_json() -> &'static str {
    r##"{
  "header": {
    "contractName": "2026년 청사 시설물 유지보수",
    "center": "서울센터",
    "round": "3",
    "orderNumber": "WO-2026-0412",
    "issuedOn": "2026-04-30"
  },
  "processes": [
    {
      "processName": "방수공사",
      "endDate": "2026-04-12",
      "tasks": [
        {
          "code": "W-101",
          "name": "우레탄 도막방수",
          "spec": "3mm",
          "unit": "m2",
          "unitCount": 42.5,
          "calcDetail": "8.5 x 5",
          "unitPriceId": "호표 12",
          "materialCost": 12000,
          "materialPrice": 510000,
          "laborCost": 15000,
          "laborPrice": 637500,
          "expenseCost": 800,
          "expensePrice": 34000,
          "totalCost": 27800,
          "totalPrice": 1181500
        },
        {
          "code": "W-102",
          "name": "바탕면 정리",
          "unit": "m2",
          "unitCount": "42.5",
          "laborCost": "4,000",
          "laborPrice": "170,000",
          "totalCost": "4,000",
          "totalPrice": "170,000"
        }
      ]
    },
    {
      "processName": "도장공사",
      "endDate": "2026-04-20",
      "tasks": [
        {
          "code": "P-201",
          "name": "수성페인트",
          "spec": "2회",
          "unit": "m2",
          "unitCount": 120,
          "materialCost": 1500,
          "materialPrice": 180000,
          "laborCost": 3000,
          "laborPrice": 360000,
          "totalCost": 4500,
          "totalPrice": 540000
        }
      ]
    }
  ]
}
"##
}
