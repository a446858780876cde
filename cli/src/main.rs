//! xml2docx CLI - XML to Word document generation
//!
//! Reads an XML file, extracts values with XPath rules and writes them as
//! styled paragraphs into a Word document built from a template.

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use colored::*;
use log::debug;
use xml2docx::{list_encodings, run, ConvertOptions, ExitCode, Invocation, Outcome, ParagraphStyle};

/// Generate Word documents from XML data
#[derive(Parser, Debug)]
#[command(
    name = "xml2docx",
    author = "iyulab",
    version,
    about = "Generate Word documents from XML data",
    long_about = "xml2docx - Extract values from an XML file with XPath rules and write them\n\
                  as styled paragraphs into a Word document built from a template.\n\n\
                  Run without arguments for the argument syntax and rule examples."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Title heading text (default: input file name)
    #[arg(long)]
    title: Option<String>,

    /// Do not link the output document to its template
    #[arg(long)]
    no_template_link: bool,

    /// `encodings`, or <xml in> <xml encoding> <word template> <word out> <items xpath> <rule>...
    #[arg(
        value_name = "ARGS",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    args: Vec<String>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e.kind());
            print!("{}", usage_text());
            std::process::exit(ExitCode::Usage.code());
        }
    };

    init_logging(cli.verbose);
    std::process::exit(execute(cli).code());
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn execute(cli: Cli) -> ExitCode {
    if is_encodings_request(&cli.args) {
        print_encodings();
        return ExitCode::EncodingsListed;
    }

    let Some(invocation) = Invocation::from_args(&cli.args) else {
        print!("{}", usage_text());
        return ExitCode::Usage;
    };
    debug!("{:?}", invocation);

    let mut options = ConvertOptions::new().with_template_link(!cli.no_template_link);
    if let Some(title) = cli.title {
        options = options.with_title(title);
    }

    let outcome = run(&invocation, &options);
    print_outcome(&outcome);
    outcome.exit_code
}

fn is_encodings_request(args: &[String]) -> bool {
    args.len() == 1 && args[0].eq_ignore_ascii_case("encodings")
}

fn print_encodings() {
    for info in list_encodings() {
        println!("{}\t{}", info.code_page, info.name());
    }
    println!();
}

fn print_outcome(outcome: &Outcome) {
    if outcome.is_success() {
        println!("{}", "Done.".green().bold());
        return;
    }

    println!("{}", "Errors occured".red().bold());
    println!("===============");
    println!();
    for error in &outcome.errors {
        println!("{}", error.message.red());
        if let Some(ref detail) = error.detail {
            println!("{}", detail);
        }
        println!();
    }
    println!();
}

fn usage_text() -> String {
    let styles: Vec<&str> = ParagraphStyle::ALL.iter().map(|s| s.name()).collect();
    let mut text = String::new();

    text.push_str("Usage: xml2docx encodings\n");
    text.push_str("  Lists all available encodings\n\n");
    text.push_str(&format!(
        "Usage: xml2docx <xml in> <xml encoding> <word template> <word out> <items xpath> \
         <{{{}}}{{:item xpath:[attr name]:[format]}}>+\n",
        styles.join("|")
    ));
    text.push_str("  Reads the XML file and creates a Word document.\n\n");
    text.push_str("  Item XPath examples:\n");
    text.push_str("    > Heading2:./Fields/Field[@Name='Title']:Value:\n");
    text.push_str("    Finds the <Field> element using the Name attribute.\n");
    text.push_str("    Takes the value of the Value attribute.\n\n");
    text.push_str("    > Heading2:./Fields/Field[@Name='DateChanged']::DateChanged: {0}\n");
    text.push_str("    Finds the <Field> element using the Name attribute.\n");
    text.push_str("    Takes the text of the element.\n");
    text.push_str("    The value is then formatted to include a label in front of the value.\n\n");
    text.push_str("    > Paragraph::: Static line\n");
    text.push_str("    Writes the same text for every item.\n\n");
    text.push_str("About <word template>\n");
    text.push_str("  A template is necessary in order to use titles.\n");
    text.push_str("  Word ships a default one as QuickStyles/Default.dotx in its install folder.\n\n");
    text.push_str("Options: -v/--verbose, --title <TEXT>, --no-template-link, -h/--help, -V/--version\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_args_keep_colons_and_hyphens() {
        let cli = Cli::try_parse_from([
            "xml2docx",
            "-vv",
            "in.xml",
            "utf-8",
            "t.dotx",
            "out.docx",
            "/WorkItems/WorkItem",
            "Paragraph::: -5 degrees",
            "-Heading1:x::",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.args.len(), 7);
        assert_eq!(cli.args[5], "Paragraph::: -5 degrees");
        assert_eq!(cli.args[6], "-Heading1:x::");
    }

    #[test]
    fn test_encodings_request() {
        assert!(is_encodings_request(&["encodings".to_string()]));
        assert!(is_encodings_request(&["ENCODINGS".to_string()]));
        assert!(!is_encodings_request(&[
            "encodings".to_string(),
            "x".to_string()
        ]));
        assert!(!is_encodings_request(&[]));
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from(["xml2docx", "--title", "Report", "--no-template-link"])
            .unwrap();
        assert_eq!(cli.title.as_deref(), Some("Report"));
        assert!(cli.no_template_link);
        assert!(cli.args.is_empty());
    }

    #[test]
    fn test_too_few_args_is_usage() {
        let cli = Cli::try_parse_from(["xml2docx", "a.xml", "utf-8"]).unwrap();
        assert_eq!(execute(cli), ExitCode::Usage);
    }

    #[test]
    fn test_usage_text() {
        let usage = usage_text();
        assert!(usage.contains("<{Paragraph|Heading1|Heading2|Heading3}{:item xpath:[attr name]:[format]}>+"));
        assert!(usage.contains("Heading2:./Fields/Field[@Name='DateChanged']::DateChanged: {0}"));
        assert!(usage.contains("A template is necessary in order to use titles."));
    }
}
