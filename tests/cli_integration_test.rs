//! CLI integration tests with real INI and CSV files on disk.

use clap::Parser;
use signalbot::cli::{self, Cli};
use std::io::Write;
use std::process::ExitCode;

fn write_temp(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn run(args: &[&str]) -> ExitCode {
    let mut argv = vec!["signalbot"];
    argv.extend_from_slice(args);
    cli::run(Cli::try_parse_from(argv).unwrap())
}

// ExitCode has no PartialEq; compare through Debug.
fn assert_exit(actual: ExitCode, expected: u8) {
    let expected = if expected == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(expected)
    };
    assert_eq!(format!("{actual:?}"), format!("{expected:?}"));
}

const CROSSOVER_INI: &str = r#"
[strategy]
name = simple-mac-crossover
symbol = test
window = 3
short_window = 2
long_window = 3
risk_tolerance = 0.02
cash_at_risk = 0.1

[backtest]
initial_cash = 10000
commission_pct = 0.1
slippage_pct = 0.05
"#;

const PRICES_CSV: &str = "date,open,high,low,close,volume\n\
2024-01-01,10,10,10,10,100\n\
2024-01-02,11,11,11,11,100\n\
2024-01-03,12,12,12,12,100\n\
2024-01-04,11,11,11,11,100\n\
2024-01-05,10,10,10,10,100\n\
2024-01-06,9,9,9,9,100\n\
2024-01-07,8,8,8,8,100\n\
2024-01-08,9,9,9,9,100\n\
2024-01-09,10,10,10,10,100\n\
2024-01-10,11,11,11,11,100\n";

mod validate {
    use super::*;

    #[test]
    fn valid_config_succeeds() {
        let ini = write_temp(CROSSOVER_INI, ".ini");
        let path = ini.path().to_str().unwrap();
        assert_exit(run(&["validate", "--config", path]), 0);
    }

    #[test]
    fn strategy_override_is_validated() {
        let ini = write_temp(CROSSOVER_INI, ".ini");
        let path = ini.path().to_str().unwrap();
        assert_exit(
            run(&["validate", "--config", path, "--strategy", "rsi-crossover"]),
            0,
        );
        assert_exit(
            run(&["validate", "--config", path, "--strategy", "martingale"]),
            2,
        );
    }

    #[test]
    fn out_of_range_parameter_fails() {
        let ini = write_temp("[strategy]\nname = bollinger-bands\nwindow = 0\n", ".ini");
        let path = ini.path().to_str().unwrap();
        assert_exit(run(&["validate", "--config", path]), 2);
    }

    #[test]
    fn missing_name_fails() {
        let ini = write_temp("[strategy]\nsymbol = SPY\n", ".ini");
        let path = ini.path().to_str().unwrap();
        assert_exit(run(&["validate", "--config", path]), 2);
    }

    #[test]
    fn missing_file_fails() {
        assert_exit(
            run(&["validate", "--config", "/nonexistent/signalbot.ini"]),
            2,
        );
    }
}

mod backtest {
    use super::*;

    #[test]
    fn replays_csv_prices() {
        let ini = write_temp(CROSSOVER_INI, ".ini");
        let csv = write_temp(PRICES_CSV, ".csv");
        assert_exit(
            run(&[
                "backtest",
                "--config",
                ini.path().to_str().unwrap(),
                "--data",
                csv.path().to_str().unwrap(),
            ]),
            0,
        );
    }

    #[test]
    fn every_strategy_replays() {
        let ini = write_temp(CROSSOVER_INI, ".ini");
        let csv = write_temp(PRICES_CSV, ".csv");
        for name in [
            "ema-crossover",
            "bollinger-bands",
            "mean-revision",
            "rsi-crossover",
            "aroon-crossover",
            "volatility-atr",
        ] {
            assert_exit(
                run(&[
                    "backtest",
                    "--config",
                    ini.path().to_str().unwrap(),
                    "--data",
                    csv.path().to_str().unwrap(),
                    "--strategy",
                    name,
                ]),
                0,
            );
        }
    }

    #[test]
    fn sentiment_strategy_uses_configured_reading() {
        let ini = write_temp(
            "[strategy]\nname = sentiment\nsymbol = TEST\nwindow = 2\n\n\
             [backtest]\ninitial_cash = 10000\nsentiment = negative\nsentiment_probability = 0.95\n",
            ".ini",
        );
        let csv = write_temp(PRICES_CSV, ".csv");
        assert_exit(
            run(&[
                "backtest",
                "--config",
                ini.path().to_str().unwrap(),
                "--data",
                csv.path().to_str().unwrap(),
            ]),
            0,
        );
    }

    #[test]
    fn missing_data_file_is_data_error() {
        let ini = write_temp(CROSSOVER_INI, ".ini");
        assert_exit(
            run(&[
                "backtest",
                "--config",
                ini.path().to_str().unwrap(),
                "--data",
                "/nonexistent/prices.csv",
            ]),
            3,
        );
    }

    #[test]
    fn empty_data_file_is_data_error() {
        let ini = write_temp(CROSSOVER_INI, ".ini");
        let csv = write_temp("date,open,high,low,close\n", ".csv");
        assert_exit(
            run(&[
                "backtest",
                "--config",
                ini.path().to_str().unwrap(),
                "--data",
                csv.path().to_str().unwrap(),
            ]),
            3,
        );
    }

    #[test]
    fn invalid_backtest_section_fails() {
        let ini = write_temp(
            "[strategy]\nname = aroon-crossover\nsymbol = TEST\n\n[backtest]\ninitial_cash = -5\n",
            ".ini",
        );
        let csv = write_temp(PRICES_CSV, ".csv");
        assert_exit(
            run(&[
                "backtest",
                "--config",
                ini.path().to_str().unwrap(),
                "--data",
                csv.path().to_str().unwrap(),
            ]),
            2,
        );
    }
}

#[test]
fn strategies_lists_identifiers() {
    assert_exit(run(&["strategies"]), 0);
}
