use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use labmaterials::calculator::{BinaryOp, Calculator, UnaryOp};
use labmaterials::config::Settings;
use labmaterials::session::{Flow, SessionController};
use labmaterials::types::{BorrowLedger, MATERIALS_SEPARATOR};

/// Laboratory materials borrowing station
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding accounts.txt, database.txt and log.csv
    #[arg(long, env = "LABMATERIALS_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,
    /// IANA time zone for borrow timestamps
    #[arg(long, env = "LABMATERIALS_TZ", default_value = "Asia/Manila")]
    timezone: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new borrower
    Register { name: String, student_id: String },
    /// Log in and borrow materials given as MATERIAL=QTY
    Borrow {
        name: String,
        student_id: String,
        #[arg(required = true)]
        picks: Vec<String>,
    },
    /// Log in with the superuser credential and manage stock
    Admin {
        name: String,
        student_id: String,
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Print current stock
    Inventory,
    /// Print every committed borrowing
    History,
    /// Evaluate a calculator operation; trigonometric functions take degrees
    Calc {
        #[arg(value_enum)]
        op: CalcOp,
        a: String,
        /// Second operand, required by the two-operand operations
        b: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CalcOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Exponent,
    Sqrt,
    Sin,
    Cos,
    Tan,
}

impl CalcOp {
    fn evaluate(self, calculator: &mut Calculator, a: &str, b: Option<&str>) -> Result<f64> {
        let binary_op = match self {
            CalcOp::Add => BinaryOp::Add,
            CalcOp::Subtract => BinaryOp::Subtract,
            CalcOp::Multiply => BinaryOp::Multiply,
            CalcOp::Divide => BinaryOp::Divide,
            CalcOp::Exponent => BinaryOp::Exponent,
            CalcOp::Sqrt => return Ok(calculator.unary(UnaryOp::SquareRoot, a)?),
            CalcOp::Sin => return Ok(calculator.unary(UnaryOp::Sin, a)?),
            CalcOp::Cos => return Ok(calculator.unary(UnaryOp::Cos, a)?),
            CalcOp::Tan => return Ok(calculator.unary(UnaryOp::Tan, a)?),
        };
        let b = b.ok_or_else(|| anyhow!("'{self:?}' needs a second operand"))?;
        Ok(calculator.binary(binary_op, a, b)?)
    }
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    /// Print current stock
    List,
    /// Add a material or replace its quantity
    Set { material: String, quantity: u32 },
    /// Remove a material
    Remove { material: String },
}

/// Splits `Beaker=3` into its name and quantity.
fn parse_pick(pick: &str) -> Result<(&str, u32)> {
    let (name, quantity) = pick
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Expected MATERIAL=QTY, got '{pick}'"))?;
    let quantity = quantity
        .trim()
        .parse()
        .with_context(|| format!("Invalid quantity in '{pick}'"))?;
    Ok((name, quantity))
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    if let Command::Calc { op, a, b } = &args.command {
        let mut calculator = Calculator::new();
        op.evaluate(&mut calculator, a, b.as_deref())?;
        print!("{calculator}");
        return Ok(());
    }

    let mut settings = Settings::in_dir(&args.data_dir);
    settings.timezone = args
        .timezone
        .parse::<Tz>()
        .map_err(|err| anyhow!("Unknown time zone '{}': {err}", args.timezone))?;
    let (accounts, inventory, ledger) = settings.paths.open();
    let mut controller = SessionController::new(accounts, inventory, ledger, settings.timezone);

    match args.command {
        Command::Register { name, student_id } => {
            controller.register(&name, &student_id)?;
            println!("You have been registered!");
        }
        Command::Borrow {
            name,
            student_id,
            picks,
        } => {
            if controller.login(&name, &student_id)? != Flow::Borrowing {
                bail!("The superuser cannot borrow materials");
            }
            for pick in &picks {
                let (material, quantity) = parse_pick(pick)?;
                controller.add_pick(material, quantity)?;
            }
            let receipt = controller.finish_borrowing(Utc::now())?;
            print!("{receipt}");
        }
        Command::Admin {
            name,
            student_id,
            action,
        } => {
            if controller.login(&name, &student_id)? != Flow::Admin {
                bail!("Stock management requires the superuser credential");
            }
            match action {
                AdminAction::List => {}
                AdminAction::Set { material, quantity } => {
                    controller.admin_upsert(&material, quantity)?;
                }
                AdminAction::Remove { material } => controller.admin_remove(&material)?,
            }
            for line in controller.stock_listing()? {
                println!("{line}");
            }
        }
        Command::Inventory => {
            for line in controller.stock_listing()? {
                println!("{line}");
            }
        }
        Command::Calc { .. } => {}
        Command::History => {
            for record in controller.ledger().records()? {
                println!(
                    "{} | {} ({}) | {}",
                    record.timestamp(),
                    record.borrower(),
                    record.student_id(),
                    record.materials().join(MATERIALS_SEPARATOR)
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pick() {
        assert_eq!(parse_pick("Beaker=3").unwrap(), ("Beaker", 3));
        assert_eq!(parse_pick("Bunsen burner= 2").unwrap(), ("Bunsen burner", 2));
        assert!(parse_pick("Beaker").is_err());
        assert!(parse_pick("Beaker=-1").is_err());
    }

    #[test]
    fn test_calc_op_operands() {
        let mut calculator = Calculator::new();
        assert_eq!(CalcOp::Exponent.evaluate(&mut calculator, "3", Some("2")).unwrap(), 9.0);
        assert_eq!(CalcOp::Sqrt.evaluate(&mut calculator, "9", None).unwrap(), 3.0);
        assert!(CalcOp::Add.evaluate(&mut calculator, "1", None).is_err());
        assert_eq!(calculator.history(), ["3 ^ 2 = 9", "√9 = 3"]);
    }
}
