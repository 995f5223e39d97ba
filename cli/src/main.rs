use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use coursehub::app::AppContext;
use coursehub::config::{ClientConfig, ConfigError};
use coursehub::messages::{self, Locale, Message};
use coursehub::net::api::{self, UploadFile};
use coursehub::net::error::ApiError;
use coursehub::net::types::{CourseInput, Credentials, GradeInput, HomeworkInput, SubmissionInput, User};
use coursehub::routes::router::NavigationError;
use coursehub::routes::{DASHBOARD_PATH, LOGIN_PATH};
use coursehub::state::session::SessionError;
use coursehub::util::format::{format_date, format_file_size, format_status};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Login(#[from] SessionError),
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),
    #[error("{requested} is not available to this account (sent to {landed})")]
    Denied { requested: String, landed: String },
    #[error("not signed in; run `coursehub-cli login` first")]
    NotSignedIn,
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl CliError {
    /// Text for the terminal: API failures use the localized user message.
    fn describe(&self, locale: Locale) -> String {
        match self {
            Self::Api(error) | Self::Login(SessionError::Api(error)) => error.user_message(locale),
            Self::Login(SessionError::Rejected { message, .. }) => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or(messages::text(Message::LoginFailed, locale))
                .to_owned(),
            other => other.to_string(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "coursehub-cli", about = "Course management client")]
struct Cli {
    /// Overrides `COURSEHUB_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `COURSEHUB_SESSION_FILE`.
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "COURSEHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    /// Resolve a route through the guard and print where it lands.
    Navigate {
        path: String,
    },
    Course(CourseCommand),
    Homework(HomeworkCommand),
    Resource(ResourceCommand),
    Submission(SubmissionCommand),
}

#[derive(Args, Debug)]
struct CourseCommand {
    #[command(subcommand)]
    command: CourseSubcommand,
}

#[derive(Subcommand, Debug)]
enum CourseSubcommand {
    List,
    Show {
        course_id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        teacher_id: Option<i64>,
    },
    Enroll {
        course_id: i64,
    },
    Drop {
        course_id: i64,
    },
    Students {
        course_id: i64,
    },
}

#[derive(Args, Debug)]
struct HomeworkCommand {
    #[command(subcommand)]
    command: HomeworkSubcommand,
}

#[derive(Subcommand, Debug)]
enum HomeworkSubcommand {
    List {
        course_id: i64,
    },
    Show {
        homework_id: i64,
    },
    Create {
        #[arg(long)]
        course_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Local time as `yyyy-MM-ddTHH:mm:ss`.
        #[arg(long)]
        deadline: String,
    },
}

#[derive(Args, Debug)]
struct ResourceCommand {
    #[command(subcommand)]
    command: ResourceSubcommand,
}

#[derive(Subcommand, Debug)]
enum ResourceSubcommand {
    List {
        course_id: i64,
    },
    Upload {
        #[arg(long)]
        course_id: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        file: PathBuf,
    },
    Download {
        resource_id: i64,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    Delete {
        resource_id: i64,
    },
}

#[derive(Args, Debug)]
struct SubmissionCommand {
    #[command(subcommand)]
    command: SubmissionSubcommand,
}

#[derive(Subcommand, Debug)]
enum SubmissionSubcommand {
    Submit {
        homework_id: i64,
        #[arg(long)]
        content: String,
    },
    /// Every submission for one homework (teachers).
    List {
        homework_id: i64,
    },
    /// The signed-in student's own submissions.
    Mine,
    Grade {
        homework_id: i64,
        submission_id: i64,
        #[arg(long)]
        score: i64,
        #[arg(long)]
        comment: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };
    let locale = config.locale;

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {}", error.describe(locale));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }
    if let Some(session_file) = &cli.session_file {
        config.session_file.clone_from(session_file);
    }
    Ok(config)
}

async fn run(command: Command, config: ClientConfig) -> Result<(), CliError> {
    let app = AppContext::from_config(config)?;
    match command {
        Command::Login { username, password } => run_login(&app, username, password).await,
        Command::Logout => {
            api::logout(app.api()).await;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            enter(&app, DASHBOARD_PATH)?;
            let user = api::current_user(app.api()).await?;
            println!("{} ({}) {}", user.display_name(), user.username, user.role);
            Ok(())
        }
        Command::Navigate { path } => {
            let nav = app.router().navigate(&path)?;
            let name = nav.route.name().unwrap_or("-");
            if nav.redirected() {
                println!("{} -> {} [{name}]", nav.requested, nav.route.path);
            } else {
                println!("{} [{name}]", nav.route.path);
            }
            Ok(())
        }
        Command::Course(course) => run_course(&app, course).await,
        Command::Homework(homework) => run_homework(&app, homework).await,
        Command::Resource(resource) => run_resource(&app, resource).await,
        Command::Submission(submission) => run_submission(&app, submission).await,
    }
}

async fn run_login(app: &AppContext, username: String, password: String) -> Result<(), CliError> {
    let nav = app.router().navigate(LOGIN_PATH)?;
    if nav.redirected() {
        let name = app.session().user().map(|u| u.display_name().to_owned()).unwrap_or_default();
        println!("already signed in as {name}");
        return Ok(());
    }

    let credentials = Credentials { username, password };
    let user = app.session().login(app.api(), &credentials).await?;
    app.router().navigate(DASHBOARD_PATH)?;
    println!("signed in as {} ({})", user.display_name(), user.role);
    Ok(())
}

async fn run_course(app: &AppContext, course: CourseCommand) -> Result<(), CliError> {
    match course.command {
        CourseSubcommand::List => {
            enter(app, DASHBOARD_PATH)?;
            for course in api::list_courses(app.api()).await? {
                let teacher = course.teacher_name.as_deref().unwrap_or("-");
                println!("{:>5}  {}  ({teacher})", course.id, course.name);
            }
            Ok(())
        }
        CourseSubcommand::Show { course_id } => {
            enter(app, DASHBOARD_PATH)?;
            print_json(&api::get_course(app.api(), course_id).await?)
        }
        CourseSubcommand::Create { name, description, teacher_id } => {
            enter(app, "/courses")?;
            let input = CourseInput { name, description, teacher_id };
            print_json(&api::create_course(app.api(), &input).await?)
        }
        CourseSubcommand::Enroll { course_id } => {
            enter(app, "/student-assignments")?;
            api::select_course(app.api(), course_id).await?;
            println!("enrolled in course {course_id}");
            Ok(())
        }
        CourseSubcommand::Drop { course_id } => {
            enter(app, "/student-assignments")?;
            api::drop_course(app.api(), course_id).await?;
            println!("dropped course {course_id}");
            Ok(())
        }
        CourseSubcommand::Students { course_id } => {
            enter(app, "/studentManagement")?;
            for student in api::course_students(app.api(), course_id).await? {
                let name = student.real_name.as_deref().unwrap_or(&student.username);
                let class = student.classname.as_deref().unwrap_or("-");
                println!("{:>5}  {name}  {class}", student.id);
            }
            Ok(())
        }
    }
}

async fn run_homework(app: &AppContext, homework: HomeworkCommand) -> Result<(), CliError> {
    enter(app, "/assignments")?;
    match homework.command {
        HomeworkSubcommand::List { course_id } => {
            for homework in api::list_course_homework(app.api(), course_id).await? {
                let deadline = homework.deadline.as_deref().map_or_else(|| "-".to_owned(), format_date);
                println!("{:>5}  {}  due {deadline}", homework.id, homework.title);
            }
            Ok(())
        }
        HomeworkSubcommand::Show { homework_id } => print_json(&api::get_homework(app.api(), homework_id).await?),
        HomeworkSubcommand::Create { course_id, title, content, deadline } => {
            let input = HomeworkInput { title, content, course_id, deadline };
            print_json(&api::create_homework(app.api(), &input).await?)
        }
    }
}

async fn run_resource(app: &AppContext, resource: ResourceCommand) -> Result<(), CliError> {
    enter(app, "/resources")?;
    match resource.command {
        ResourceSubcommand::List { course_id } => {
            for resource in api::list_course_resources(app.api(), course_id).await? {
                let size = resource.file_size.map_or_else(|| "-".to_owned(), format_file_size);
                println!("{:>5}  {}  {size}", resource.id, resource.name);
            }
            Ok(())
        }
        ResourceSubcommand::Upload { course_id, name, description, file } => {
            let upload = read_upload(&file)?;
            let created = api::upload_resource(app.api(), course_id, &name, description.as_deref(), upload).await?;
            print_json(&created)
        }
        ResourceSubcommand::Download { resource_id, out } => {
            let response = api::download_resource(app.api(), resource_id).await?;
            let saved = response.save_to(&out, &format!("resource-{resource_id}"))?;
            println!("saved {} ({})", saved.display(), format_file_size(response.body.len() as u64));
            Ok(())
        }
        ResourceSubcommand::Delete { resource_id } => {
            api::delete_resource(app.api(), resource_id).await?;
            println!("deleted resource {resource_id}");
            Ok(())
        }
    }
}

async fn run_submission(app: &AppContext, submission: SubmissionCommand) -> Result<(), CliError> {
    let locale = app.api().locale();
    match submission.command {
        SubmissionSubcommand::Submit { homework_id, content } => {
            enter(app, &format!("/homework-submission/{homework_id}"))?;
            let created = api::submit_homework(app.api(), homework_id, &SubmissionInput { content }).await?;
            print_json(&created)
        }
        SubmissionSubcommand::List { homework_id } => {
            enter(app, &format!("/assignment-submissions/{homework_id}"))?;
            for row in api::homework_submissions(app.api(), homework_id).await? {
                let student = row.student_name.as_deref().unwrap_or("-");
                let status = row.status.as_deref().map_or_else(|| "-".to_owned(), |s| format_status(s, locale));
                let score = row.score.map_or_else(|| "-".to_owned(), |s| s.to_string());
                println!("{:>5}  {student}  {status}  {score}", row.id);
            }
            Ok(())
        }
        SubmissionSubcommand::Mine => {
            enter(app, "/student-assignments")?;
            let user = signed_in_user(app)?;
            let student_id = user.id.ok_or(CliError::NotSignedIn)?;
            for row in api::student_submissions(app.api(), student_id).await? {
                let title = row.assignment_title.as_deref().unwrap_or("-");
                let status = row.status.as_deref().map_or_else(|| "-".to_owned(), |s| format_status(s, locale));
                println!("{:>5}  {title}  {status}", row.id);
            }
            Ok(())
        }
        SubmissionSubcommand::Grade { homework_id, submission_id, score, comment } => {
            enter(app, &format!("/assignment-submissions/{homework_id}"))?;
            api::grade_submission(app.api(), submission_id, &GradeInput { score, comment }).await?;
            println!("graded submission {submission_id}: {score}");
            Ok(())
        }
    }
}

/// Navigate to the command's view route and refuse to run if the guard
/// sent us elsewhere.
fn enter(app: &AppContext, path: &str) -> Result<(), CliError> {
    let nav = app.router().navigate(path)?;
    if !nav.redirected() {
        return Ok(());
    }
    if nav.route.path == LOGIN_PATH {
        return Err(CliError::NotSignedIn);
    }
    Err(CliError::Denied { requested: nav.requested, landed: nav.route.path })
}

fn signed_in_user(app: &AppContext) -> Result<User, CliError> {
    app.session().user().ok_or(CliError::NotSignedIn)
}

fn read_upload(path: &Path) -> Result<UploadFile, CliError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
    Ok(UploadFile { file_name, bytes })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
