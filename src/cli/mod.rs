use crate::db::{self, documents::DocumentRepository, interviews::InterviewRepository};
use crate::languages;
use anyhow::Result;
use chrono::DateTime;
use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "pairview")]
#[command(about = "Collaborative interview coding service", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// List the supported execution languages
    Languages,
    /// Show the code document for a meeting
    Document(DocumentCliArgs),
    /// List scheduled interviews
    Interviews,
}

#[derive(ClapArgs, Debug)]
pub struct DocumentCliArgs {
    /// Meeting identifier of the document to show
    pub meeting_id: String,
}

pub fn handle_languages_command() -> Result<()> {
    for language in languages::LANGUAGES {
        println!("{:<12} {:<12} {}", language.value, language.version, language.label);
    }
    Ok(())
}

pub fn handle_document_command(args: DocumentCliArgs) -> Result<()> {
    let conn = db::init_db()?;

    let code = DocumentRepository::get_code(&conn, &args.meeting_id)?;
    let language = DocumentRepository::get_language(&conn, &args.meeting_id)?;
    let output = DocumentRepository::get_output(&conn, &args.meeting_id)?;

    println!("Meeting:  {}", args.meeting_id);
    println!("Language: {}", language);
    println!("--- code ---");
    println!("{}", code);
    if !output.is_empty() {
        println!("--- output ---");
        println!("{}", output);
    }

    Ok(())
}

pub fn handle_interviews_command() -> Result<()> {
    let conn = db::init_db()?;
    let interviews = InterviewRepository::list(&conn)?;

    if interviews.is_empty() {
        println!("No interviews scheduled");
        return Ok(());
    }

    for interview in interviews {
        let start = DateTime::from_timestamp_millis(interview.start_time)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| interview.start_time.to_string());
        println!(
            "#{:<4} {:<10} {:<18} candidate={} interviewers={}",
            interview.id,
            interview.status,
            start,
            interview.candidate_id,
            interview.interviewer_ids.join(",")
        );
        println!("      {}", interview.title);
    }

    Ok(())
}
