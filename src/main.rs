use clap::{Parser, Subcommand};
use conferio_client::{
    AppConfig, Conferio, ConferioError, Env,
    guard::Navigation,
    models::{FeedbackRequest, ProposalRequest, Role, SignupForm, UpdateProfileRequest},
    views::{self, RoleFilter},
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// conferio
///
/// Command-line front end of the conference client. Commands that belong to a view are
/// checked against the access guard first and print the redirect instead of running
/// when the current identity may not open it.
#[derive(Parser)]
#[command(name = "conferio", version, about = "Conference management client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the identity.
    Login {
        username: String,
        #[arg(long, env = "CONFERIO_PASSWORD")]
        password: String,
    },
    /// Create an account, then sign in.
    Signup {
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long, env = "CONFERIO_PASSWORD")]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Forget the stored identity.
    Logout,
    /// Show the current identity and its menu.
    Whoami,
    /// Check where navigating to a path would land.
    Open { path: String },
    /// List sessions with registration state.
    Sessions,
    /// Register for a session.
    Register { session_id: i64 },
    /// List your proposals.
    MyProposals,
    /// Submit a proposal.
    Propose {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
    /// Edit one of your pending proposals.
    EditProposal {
        proposal_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Withdraw one of your pending proposals.
    Withdraw { proposal_id: i64 },
    /// Show the review queue.
    Proposals,
    /// Accept or reject a proposal.
    Review {
        proposal_id: i64,
        status: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Leave feedback on a session.
    Feedback {
        session_id: i64,
        #[arg(long, default_value_t = 5)]
        rating: i32,
        #[arg(long)]
        comment: String,
    },
    /// List feedback for a session (coordinators).
    SessionFeedback { session_id: i64 },
    /// Delete a feedback entry (coordinators).
    DeleteFeedback { feedback_id: i64, session_id: i64 },
    /// Delete a session (coordinators).
    DeleteSession { session_id: i64 },
    /// List users (admins).
    Users {
        #[arg(long)]
        role: Option<Role>,
    },
    /// Show somebody's profile.
    User { username: String },
    /// Update your profile.
    Profile {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
    },
    /// Change a user's role (admins).
    SetRole { user_id: i64, role: Role },
    /// Delete a user (admins).
    DeleteUser { user_id: i64 },
}

impl Command {
    /// The view each command belongs to. Identity commands are not views.
    fn route(&self) -> Option<String> {
        let route = match self {
            Command::Logout | Command::Whoami => return None,
            Command::Login { .. } => "/login".into(),
            Command::Signup { .. } => "/signup".into(),
            Command::Open { path } => path.clone(),
            Command::Sessions | Command::Register { .. } => "/sessions".into(),
            Command::MyProposals
            | Command::Propose { .. }
            | Command::EditProposal { .. }
            | Command::Withdraw { .. } => "/my-proposals".into(),
            Command::Proposals | Command::Review { .. } => "/proposals".into(),
            Command::Feedback { session_id, .. } => format!("/feedback/session/{session_id}"),
            Command::SessionFeedback { .. }
            | Command::DeleteFeedback { .. }
            | Command::DeleteSession { .. } => "/coordinator-dashboard".into(),
            Command::Users { .. } | Command::SetRole { .. } | Command::DeleteUser { .. } => {
                "/admin-dashboard".into()
            }
            Command::User { username } => format!("/profile/{}", urlencoding::encode(username)),
            Command::Profile { .. } => "/profile".into(),
        };
        Some(route)
    }
}

/// main
///
/// Entry point of the CLI: configuration, logging, the restored client context, then the
/// one command that was asked for.
#[tokio::main]
async fn main() -> ExitCode {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // `.env` is applied first so `AppConfig::load()` sees it. Production refuses to start
    // without an explicit backend URL.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise the client logs at debug and reqwest at info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "conferio_client=debug,conferio=debug,reqwest=info".into());

    // 3. Initialize Logging based on Environment
    // Logs go to stderr so command output stays pipeable.
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for a human at the terminal.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        Env::Production => {
            // PROD: JSON lines for log collectors.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    // 4. Command Line Parsing
    let cli = Cli::parse();
    tracing::debug!(api = %config.api_base_url, "client starting in {:?} mode", config.env);

    // 5. Client Context
    // Restores the persisted identity; a missing or unusable record means signed out.
    let conferio = Conferio::start(config).await;

    // 6. Run the command
    // Errors are printed with the redirect they imply (e.g. back to /login after a 401).
    match run(&conferio, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            if let Some(redirect) = error.redirect() {
                eprintln!("-> {redirect}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(conferio: &Conferio, command: Command) -> Result<(), ConferioError> {
    if let Some(route) = command.route()
        && let Navigation::Redirect { to } = conferio.navigate(&route)
    {
        println!("{route} is not available, redirecting to {to}");
        return Ok(());
    }

    match command {
        Command::Login { username, password } => {
            let identity = conferio.login(&username, &password).await?;
            println!("Signed in as {} ({})", identity.username, identity.role);
        }
        Command::Signup {
            username,
            email,
            full_name,
            password,
            confirm_password,
        } => {
            let form = SignupForm {
                username,
                email,
                full_name,
                password,
                confirm_password,
            };
            let identity = conferio.signup(&form).await?;
            println!("Account created. Signed in as {}", identity.username);
        }
        Command::Logout => {
            conferio.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => match conferio.identity() {
            Some(identity) => {
                println!("{} ({})", identity.username, identity.role);
                for item in conferio.menu() {
                    println!("  {:<24} {}", item.label, item.path);
                }
            }
            None => println!("Not signed in"),
        },
        Command::Open { path } => println!("{path} is open to you"),
        Command::Sessions => {
            for card in conferio.session_board().await? {
                let s = &card.session;
                let state = if card.is_registered {
                    "registered"
                } else if card.is_full {
                    "full"
                } else if card.can_register {
                    "open"
                } else {
                    "-"
                };
                let capacity = s
                    .max_participants
                    .map_or_else(|| "∞".to_string(), |max| max.to_string());
                let time = s
                    .session_time
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "#{:<4} {:<40} {:<16} {} {}/{} [{}]",
                    s.id, s.title, s.room, time, s.current_participants, capacity, state
                );
            }
        }
        Command::Register { session_id } => {
            // Warm the cache so the local registered/full checks can apply.
            conferio.session_board().await?;
            conferio.register_for_session(session_id).await?;
            println!("Registered for session {session_id}");
        }
        Command::MyProposals => {
            let proposals = conferio.loaded(conferio.my_proposals().await)?;
            if proposals.is_empty() {
                println!("No proposals yet. Create your first one!");
            }
            for p in proposals.iter() {
                println!("#{:<4} {:<40} {}", p.id, p.title, p.status);
                if let Some(reason) = views::rejection_note(p) {
                    println!("      Reason: {reason}");
                }
            }
        }
        Command::Propose { title, description } => {
            let proposal = conferio
                .create_proposal(&ProposalRequest { title, description })
                .await?;
            println!("Submitted proposal #{}", proposal.id);
        }
        Command::EditProposal {
            proposal_id,
            title,
            description,
        } => {
            let current = conferio.proposal(proposal_id).await?;
            if !views::is_editable(&current) {
                println!(
                    "Proposal #{proposal_id} is {} and can no longer be edited",
                    current.status
                );
                return Ok(());
            }
            let request = ProposalRequest {
                title: title.unwrap_or(current.title),
                description: description.unwrap_or(current.description),
            };
            conferio.update_proposal(proposal_id, &request).await?;
            println!("Updated proposal #{proposal_id}");
        }
        Command::Withdraw { proposal_id } => {
            conferio.delete_proposal(proposal_id).await?;
            println!("Withdrew proposal #{proposal_id}");
        }
        Command::Proposals => {
            let proposals = conferio.loaded(conferio.all_proposals().await)?;
            let queue = views::review_queue(&proposals);
            println!("Pending Reviews ({})", queue.pending.len());
            for p in &queue.pending {
                let by = p.submitter_name.as_deref().or(p.username.as_deref()).unwrap_or("-");
                println!("  #{:<4} {:<40} by {by}", p.id, p.title);
            }
            println!("Reviewed Proposals ({})", queue.reviewed.len());
            for p in &queue.reviewed {
                println!("  #{:<4} {:<40} {}", p.id, p.title, p.status);
            }
        }
        Command::Review {
            proposal_id,
            status,
            reason,
        } => {
            let proposal = conferio
                .review_proposal(proposal_id, Some(&status), reason.as_deref())
                .await?;
            println!("Proposal #{} is now {}", proposal.id, proposal.status);
        }
        Command::Feedback {
            session_id,
            rating,
            comment,
        } => {
            conferio
                .submit_feedback(&FeedbackRequest {
                    session_id,
                    rating,
                    comment,
                })
                .await?;
            println!("Thanks for your feedback");
        }
        Command::SessionFeedback { session_id } => {
            let feedback = conferio.loaded(conferio.session_feedback(Some(session_id)).await)?;
            println!("Feedback ({})", feedback.len());
            for f in feedback.iter() {
                let who = f.username.as_deref().unwrap_or("-");
                println!("  #{:<4} {who} {}/5 {}", f.id, f.rating, f.comment);
            }
        }
        Command::DeleteFeedback {
            feedback_id,
            session_id,
        } => {
            conferio.delete_feedback(feedback_id, session_id).await?;
            println!("Deleted feedback #{feedback_id}");
        }
        Command::DeleteSession { session_id } => {
            conferio.delete_session(session_id).await?;
            println!("Deleted session #{session_id}");
        }
        Command::Users { role } => {
            let users = conferio.loaded(conferio.admin_users().await)?;
            let counts = views::role_counts(&users);
            println!(
                "Total {} | Admins {} | Coordinators {}",
                counts.total, counts.admins, counts.coordinators
            );
            let filter = role.map_or(RoleFilter::All, RoleFilter::Only);
            for u in views::filter_users(&users, filter) {
                println!(
                    "#{:<4} {:<20} {:<30} {:<24} {}",
                    u.id,
                    u.username,
                    u.email.as_deref().unwrap_or("-"),
                    u.full_name.as_deref().unwrap_or("-"),
                    u.role
                );
            }
        }
        Command::User { username } => {
            let user = conferio.loaded(conferio.user_profile(&username).await)?;
            println!("{} ({})", user.username, user.role);
            println!("  {}", user.full_name.as_deref().unwrap_or("-"));
            println!("  {}", user.email.as_deref().unwrap_or("-"));
            if let Some(created) = user.created_at {
                println!("  member since {}", created.format("%Y-%m-%d"));
            }
        }
        Command::Profile { email, full_name } => {
            let username = conferio.identity().map(|i| i.username).unwrap_or_default();
            conferio
                .update_profile(&UpdateProfileRequest {
                    username,
                    email,
                    full_name,
                })
                .await?;
            println!("Profile updated");
        }
        Command::SetRole { user_id, role } => {
            let user = conferio.update_user_role(user_id, role).await?;
            println!("{} is now {}", user.username, user.role);
        }
        Command::DeleteUser { user_id } => {
            conferio.delete_user(user_id).await?;
            println!("Deleted user #{user_id}");
        }
    }
    Ok(())
}
