use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use workshop_attendance::{
    db,
    repositories::{
        AttendanceStore, RegistrationRepository, SqliteAttendanceStore,
        SqliteRegistrationRepository, SqliteRoleRepository, SqliteUserRepository,
        SqliteWorkshopRepository, WorkshopRepository,
    },
    services::user_service::{CreateUserRequest, UpdatePasswordRequest, UserService},
};

#[derive(Parser)]
#[command(name = "attendance-cli")]
#[command(about = "Operator tool for the workshop attendance service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Workshop reporting commands
    Workshop {
        #[command(subcommand)]
        command: WorkshopCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,

        /// Name shown on rosters
        #[arg(short = 'n', long)]
        display_name: Option<String>,

        /// Grant the admin role after creating the user
        #[arg(long)]
        admin: bool,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Grant the admin role
    GrantAdmin {
        #[arg(short, long)]
        email: String,
    },

    /// Revoke the admin role and clear the profile flag
    RevokeAdmin {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password for a user
    SetPassword {
        #[arg(short, long)]
        email: String,

        /// New password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum WorkshopCommands {
    /// List workshops in schedule order
    List,

    /// Print who checked in to a workshop
    Roster {
        /// Workshop id
        #[arg(short, long)]
        workshop_id: i64,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    rpassword::read_password().context("Failed to read password")
}

fn confirm_password(prompt: &str) -> anyhow::Result<(String, String)> {
    let password = get_password(prompt)?;
    let confirm = get_password("Confirm password")?;
    Ok((password, confirm))
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Connect to database
    let pool = db::create_pool()
        .await
        .context("Failed to connect to database")?;
    db::migrate(&pool)
        .await
        .context("Failed to run database migrations")?;

    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let role_repository = Arc::new(SqliteRoleRepository::new(pool.clone()));
    let user_service = UserService::new(user_repository, role_repository);

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Create {
                email,
                password,
                display_name,
                admin,
            } => {
                let (password, password_confirm) = match password {
                    Some(pw) => (pw.clone(), pw),
                    None => confirm_password("Password")?,
                };

                let request = CreateUserRequest {
                    email,
                    password,
                    password_confirm: Some(password_confirm),
                    display_name,
                };

                let user = match user_service.create_user(request).await {
                    Ok(user) => user,
                    Err(err) => fail(format!("Failed to create user: {}", err)),
                };

                if admin {
                    if let Err(err) = user_service.grant_admin(user.id, None).await {
                        fail(format!("User created but admin grant failed: {}", err));
                    }
                }

                println!("✅ User created successfully!");
                println!("  ID: {}", user.id);
                println!("  Email: {}", user.email);
                println!("  Admin: {}", if admin { "Yes" } else { "No" });
            }

            UserCommands::List { limit, offset } => {
                let users = match user_service.list_users(Some(limit), Some(offset)).await {
                    Ok(users) => users,
                    Err(err) => fail(format!("Failed to list users: {}", err)),
                };

                if users.is_empty() {
                    println!("No users found.");
                } else {
                    println!(
                        "{:<5} {:<40} {:<6} {:<8} {:<20}",
                        "ID", "Email", "Admin", "XP", "Created"
                    );
                    println!("{}", "-".repeat(82));
                    for user in users {
                        println!(
                            "{:<5} {:<40} {:<6} {:<8} {:<20}",
                            user.id,
                            user.email,
                            if user.is_admin { "Yes" } else { "No" },
                            user.xp_total,
                            user.created_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }

            UserCommands::GrantAdmin { email } => {
                let user = match user_service.find_user_by_email(&email).await {
                    Ok(Some(user)) => user,
                    Ok(None) => fail(format!("User '{}' not found", email)),
                    Err(err) => fail(format!("Failed to find user: {}", err)),
                };

                match user_service.grant_admin(user.id, None).await {
                    Ok(Some(_)) => println!("✅ Granted admin role to '{}'", email),
                    Ok(None) => println!("'{}' already holds the admin role", email),
                    Err(err) => fail(format!("Failed to grant admin role: {}", err)),
                }
            }

            UserCommands::RevokeAdmin { email } => {
                let user = match user_service.find_user_by_email(&email).await {
                    Ok(Some(user)) => user,
                    Ok(None) => fail(format!("User '{}' not found", email)),
                    Err(err) => fail(format!("Failed to find user: {}", err)),
                };

                match user_service.revoke_admin(user.id).await {
                    Ok(()) => println!("✅ Revoked admin role from '{}'", email),
                    Err(err) => fail(format!("Failed to revoke admin role: {}", err)),
                }
            }

            UserCommands::SetPassword { email, password } => {
                let user = match user_service.find_user_by_email(&email).await {
                    Ok(Some(user)) => user,
                    Ok(None) => fail(format!("User '{}' not found", email)),
                    Err(err) => fail(format!("Failed to find user: {}", err)),
                };

                let (new_password, new_password_confirm) = match password {
                    Some(pw) => (pw.clone(), pw),
                    None => confirm_password("New password")?,
                };

                let request = UpdatePasswordRequest {
                    user_id: user.id,
                    new_password,
                    new_password_confirm: Some(new_password_confirm),
                };

                match user_service.update_password(request).await {
                    Ok(()) => println!("✅ Password updated for '{}'", email),
                    Err(err) => fail(format!("Failed to update password: {}", err)),
                }
            }
        },

        Commands::Workshop { command } => {
            let workshops = SqliteWorkshopRepository::new(pool.clone());

            match command {
                WorkshopCommands::List => {
                    let list = workshops.list().await?;
                    let registrations = SqliteRegistrationRepository::new(pool.clone());

                    if list.is_empty() {
                        println!("No workshops found.");
                    }
                    for workshop in list {
                        let registered = registrations.count_for_workshop(workshop.id).await?;
                        println!(
                            "{:<5} {:<20} {:<8} {:<5} {}",
                            workshop.id,
                            workshop.scheduled_at.format("%Y-%m-%d %H:%M"),
                            workshop.location_mode.as_str(),
                            registered,
                            workshop.title
                        );
                    }
                }

                WorkshopCommands::Roster { workshop_id } => {
                    let workshop = match workshops.find_by_id(workshop_id).await? {
                        Some(workshop) => workshop,
                        None => fail(format!("Workshop {} not found", workshop_id)),
                    };

                    let roster = SqliteAttendanceStore::new(pool.clone())
                        .list_attendance(workshop_id)
                        .await?;

                    println!("{} ({})", workshop.title, workshop.scheduled_at.format("%Y-%m-%d"));
                    println!(
                        "{:<40} {:<8} {:<11} {:<20}",
                        "Attendee", "Method", "Registered", "Checked in"
                    );
                    println!("{}", "-".repeat(82));
                    for row in &roster {
                        println!(
                            "{:<40} {:<8} {:<11} {:<20}",
                            row.label(),
                            row.method.as_str(),
                            if row.registered { "Yes" } else { "No" },
                            row.checked_in_at.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                    println!("{} attendee(s)", roster.len());
                }
            }
        }
    }

    Ok(())
}
