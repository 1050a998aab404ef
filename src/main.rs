use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use env_logger::Env;
use symfun::{Category, Evaluation, Function, RangeOutcome};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (overrides RUST_LOG)
  #[arg(long, global = true)]
  debug: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the rendering, calculus, domain, range and category facts
  Describe {
    /// The expression, e.g. "x^2 + 1" or "2sin(x)"
    expression: String,
    /// generic, polynomial, trigonometric, rational, exponential,
    /// logarithmic or absolute
    #[arg(long, short, default_value = "generic", value_parser = parse_category)]
    category: Category,
    /// Variable for calculus, domain and range
    #[arg(long, short)]
    var: Option<String>,
  },
  /// Print evenly spaced samples as "x y" lines
  Sample {
    expression: String,
    #[arg(long, short, default_value = "generic", value_parser = parse_category)]
    category: Category,
    #[arg(long, short)]
    var: Option<String>,
    /// Left end of the interval
    #[arg(long, allow_hyphen_values = true, requires = "to")]
    from: Option<f64>,
    /// Right end of the interval
    #[arg(long, allow_hyphen_values = true, requires = "from")]
    to: Option<f64>,
    /// Number of samples
    #[arg(long, short = 'n')]
    count: Option<usize>,
    /// Print a JSON array instead
    #[arg(long)]
    json: bool,
  },
  /// Evaluate with bindings such as x=1 y=2.5
  Eval {
    expression: String,
    bindings: Vec<String>,
  },
}

fn parse_category(s: &str) -> Result<Category, String> {
  s.parse()
}

fn parse_binding(binding: &str) -> anyhow::Result<(String, f64)> {
  let (name, value) = binding
    .split_once('=')
    .ok_or_else(|| anyhow!("expected name=value, got {:?}", binding))?;
  let value = value
    .trim()
    .parse::<f64>()
    .with_context(|| format!("invalid number in binding {:?}", binding))?;
  Ok((name.trim().to_string(), value))
}

/// Print `label value`, or the error in place of the value.
fn line<T: std::fmt::Display>(label: &str, value: symfun::Result<T>) {
  match value {
    Ok(v) => println!("{:<12}{}", label, v),
    Err(e) => println!("{:<12}{}", label, e),
  }
}

fn describe(f: &Function, var: Option<&str>) {
  line("function:", Ok(f));
  line("category:", Ok(f.category()));
  line("variables:", Ok(f.variables().join(", ")));
  line("derivative:", f.derivative(var));
  line("integral:", f.integral(var));
  line("domain:", f.domain(var));
  match f.range(var, None) {
    Ok(RangeOutcome::NotComputable(reason)) => {
      println!("{:<12}not computable ({})", "range:", reason)
    }
    other => line("range:", other),
  }

  match f.category() {
    Category::Polynomial => line("degree:", f.degree()),
    Category::Rational => {
      line("numerator:", f.numerator());
      line("denominator:", f.denominator());
      line("vertical:", f.vertical_asymptotes());
      line("horizontal:", f.horizontal_asymptote());
    }
    Category::Trigonometric => {
      line("simplified:", f.simplify_trig());
      line("algebraic:", f.to_algebraic_if_possible());
    }
    _ => {}
  }
}

fn run(cli: Cli) -> anyhow::Result<()> {
  match cli.command {
    Commands::Describe {
      expression,
      category,
      var,
    } => {
      let f = Function::with_category(&expression, category)
        .with_context(|| format!("cannot read {:?}", expression))?;
      describe(&f, var.as_deref());
      Ok(())
    }
    Commands::Sample {
      expression,
      category,
      var,
      from,
      to,
      count,
      json,
    } => {
      let f = Function::with_category(&expression, category)
        .with_context(|| format!("cannot read {:?}", expression))?;
      let interval = from.zip(to);
      let samples = f.sample(var.as_deref(), interval, count)?;
      if json {
        let points: Vec<serde_json::Value> = samples
          .iter()
          .map(|s| serde_json::json!({ "x": s.x, "y": s.y }))
          .collect();
        println!("{}", serde_json::to_string_pretty(&points)?);
      } else {
        for s in samples {
          match s.y {
            Some(y) => println!("{} {}", s.x, y),
            None => println!("{} undefined", s.x),
          }
        }
      }
      Ok(())
    }
    Commands::Eval {
      expression,
      bindings,
    } => {
      let f = Function::new(&expression)
        .with_context(|| format!("cannot read {:?}", expression))?;
      let bindings = bindings
        .iter()
        .map(|b| parse_binding(b))
        .collect::<anyhow::Result<Vec<_>>>()?;
      match f.evaluate(bindings) {
        Evaluation::Number(v) => println!("{}", v),
        Evaluation::Residual(e) => println!("{}", e),
      }
      Ok(())
    }
  }
}

fn main() {
  let cli = Cli::parse();

  let mut logger =
    env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
  if cli.debug {
    logger.filter_level(log::LevelFilter::Debug);
  }
  logger.init();

  if let Err(e) = run(cli) {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}
