use crate::app::{logging, metrics, prompt};
use crate::config::Config;
use crate::core::acquisition::{Acquisition, AcquisitionOutcome, AcquisitionPlan};
use crate::core::clock::ThreadSleeper;
use crate::core::order_submit::Submission;
use crate::core::pricing::PriceMode;
use crate::core::{RunStats, Shutdown};
use crate::exchange::huobi::{HuobiClient, HuobiConfig};
use crate::exchange::SpotApi;
use crate::{Error, Result};
use rust_decimal::Decimal;
use std::env;
use std::io::{self, BufRead};
use tracing::{error, info, warn};

pub fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let cli = parse_args(&args)?;

    if cli.show_help {
        print_usage();
        return Ok(());
    }

    let config = load_or_create_config(&cli.config_path)?;
    let logging = logging::build(&config.log)?;
    tracing::dispatcher::with_default(&logging.dispatch, || execute(&cli, &config))
}

struct CliArgs {
    config_path: String,
    coin: Option<String>,
    multiple: Option<Decimal>,
    test_mode: Option<bool>,
    order_id: Option<String>,
    cancel_id: Option<String>,
    show_help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut config_path = "config.toml".to_string();
    let mut coin = None;
    let mut multiple = None;
    let mut test_mode = None;
    let mut order_id = None;
    let mut cancel_id = None;
    let mut show_help = false;

    let mut index = 1;
    while index < args.len() {
        match args[index].as_str() {
            "--help" | "-h" => {
                show_help = true;
                index += 1;
            }
            "--config" | "-c" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| Error::new("missing value for --config"))?;
                config_path = value.to_string();
                index += 2;
            }
            "--coin" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| Error::new("missing value for --coin"))?;
                coin = Some(prompt::parse_coin(value)?);
                index += 2;
            }
            "--multiple" | "-m" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| Error::new("missing value for --multiple"))?;
                multiple = Some(prompt::parse_multiple(value)?);
                index += 2;
            }
            "--test" => {
                test_mode = Some(true);
                index += 1;
            }
            "--live" => {
                test_mode = Some(false);
                index += 1;
            }
            "--order" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| Error::new("missing value for --order"))?;
                order_id = Some(value.to_string());
                index += 2;
            }
            "--cancel" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| Error::new("missing value for --cancel"))?;
                cancel_id = Some(value.to_string());
                index += 2;
            }
            unknown => {
                return Err(Error::new(format!("unknown argument: {unknown}")));
            }
        }
    }

    if order_id.is_some() && cancel_id.is_some() {
        return Err(Error::new("--order and --cancel cannot be combined"));
    }

    Ok(CliArgs {
        config_path,
        coin,
        multiple,
        test_mode,
        order_id,
        cancel_id,
        show_help,
    })
}

fn print_usage() {
    println!("usage: firstfill [--config <path>] [--coin <coin>] [--multiple <x>] [--test|--live] [--order <id>|--cancel <id>]");
    println!("  -c, --config     Path to config.toml (default: config.toml)");
    println!("      --coin       Coin to buy against usdt, e.g. puffer (prompted if absent)");
    println!("  -m, --multiple   Limit price as a multiple of the opening price (prompted if absent)");
    println!("      --test       Test mode: divide by the multiple so the order never fills");
    println!("      --live       Live mode without asking");
    println!("      --order      Print one order's status and exit");
    println!("      --cancel     Cancel one order and exit");
    println!("  -h, --help       Show this help");
}

fn load_or_create_config(path: &str) -> Result<Config> {
    if Config::ensure_template(path)? {
        println!("wrote {path}: fill in ACCESS_KEY and SECRET_KEY, then press Enter to continue");
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|err| Error::new(format!("failed to read confirmation: {err}")))?;
    }
    Config::load(path)
}

fn execute(cli: &CliArgs, config: &Config) -> Result<()> {
    if let Some(order_id) = &cli.order_id {
        let client = build_client(config)?;
        return show_order(&client, order_id);
    }
    if let Some(order_id) = &cli.cancel_id {
        let client = build_client(config)?;
        return cancel_order(&client, order_id);
    }

    let plan = resolve_plan(cli, config)?;
    info!(
        coin = %plan.coin,
        multiple = %plan.multiple,
        test_mode = plan.mode == PriceMode::Test,
        "acquisition start"
    );
    let client = build_client(config)?;

    let shutdown = Shutdown::new();
    install_shutdown_handler(&shutdown);

    let mut stats = RunStats::default();
    let acquisition = Acquisition::new(&client, &ThreadSleeper, &shutdown);
    let result = acquisition.run(&plan, &mut stats);
    info!(
        polls = stats.candle_polls,
        candle_errors = stats.candle_errors,
        submissions = stats.submissions,
        protection_waits = stats.protection_waits,
        price_lowered = stats.price_lowered,
        price_raised = stats.price_raised,
        generic_rejections = stats.generic_rejections,
        transport_failures = stats.transport_failures,
        placed = stats.placed,
        "run summary"
    );
    if let Err(err) = metrics::write_if_configured(&stats) {
        warn!(error = %err, "metrics write failed");
    }

    match result {
        Ok(AcquisitionOutcome::Submitted { submission, .. }) => {
            if let Submission::Placed { order_id, attempts } = submission {
                info!(order_id = %order_id, attempts, "acquisition finished");
            }
            Ok(())
        }
        Ok(AcquisitionOutcome::Interrupted) => Ok(()),
        Err(err) => {
            error!(kind = ?err.kind, error = %err, "acquisition aborted");
            Err(err)
        }
    }
}

fn build_client(config: &Config) -> Result<HuobiClient> {
    let client = HuobiClient::new(HuobiConfig {
        base_url: config.base_url.clone(),
        credentials: config.credentials.clone(),
        timeout_secs: config.timeout_secs,
    })?;
    info!(host = client.host(), timeout_secs = config.timeout_secs, "exchange client ready");
    Ok(client)
}

fn resolve_plan(cli: &CliArgs, config: &Config) -> Result<AcquisitionPlan> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    let coin = match &cli.coin {
        Some(coin) => coin.clone(),
        None => prompt::parse_coin(&prompt::ask(
            &mut input,
            &mut output,
            "coin to buy, e.g. puffer: ",
        )?)?,
    };
    let multiple = match cli.multiple {
        Some(multiple) => multiple,
        None => prompt::parse_multiple(&prompt::ask(
            &mut input,
            &mut output,
            "multiple of the opening price, e.g. 2.5: ",
        )?)?,
    };
    let test_mode = match cli.test_mode {
        Some(test_mode) => test_mode,
        None => prompt::parse_test_mode(&prompt::ask(
            &mut input,
            &mut output,
            "test mode? 1 = yes, 0 = no [0]: ",
        )?)?,
    };

    Ok(AcquisitionPlan {
        coin,
        quote_currency: config.quote_currency.clone(),
        multiple,
        mode: if test_mode {
            PriceMode::Test
        } else {
            PriceMode::Live
        },
    })
}

fn install_shutdown_handler(shutdown: &Shutdown) {
    let flag = shutdown.clone();
    if let Err(err) = ctrlc::set_handler(move || flag.trigger()) {
        warn!(error = %err, "ctrl-c handler not installed, only process kill will stop the run");
    }
}

fn show_order(api: &dyn SpotApi, order_id: &str) -> Result<()> {
    match api.get_order(order_id)? {
        Some(detail) => {
            info!(
                order_id = %detail.id,
                symbol = %detail.symbol,
                order_type = %detail.order_type,
                state = %detail.state,
                price = %detail.price,
                amount = %detail.amount,
                filled_amount = %detail.filled_amount,
                "order status"
            );
            Ok(())
        }
        None => Err(Error::rejected(format!("order {order_id} not found"))),
    }
}

fn cancel_order(api: &dyn SpotApi, order_id: &str) -> Result<()> {
    match api.cancel_order(order_id)? {
        Some(cancelled) => {
            info!(order_id = %cancelled, "cancel submitted");
            Ok(())
        }
        None => {
            warn!(order_id, "cancel accepted without an order id");
            Ok(())
        }
    }
}
