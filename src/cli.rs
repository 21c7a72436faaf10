use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;

use townhall_portal::api_clients::BackendStatus;
use townhall_portal::auth::{
    AdminVerification, AuthFailure, FailureKind, GuardDecision, ProfileFetchOutcome, SessionSnapshot,
    SignupOutcome,
};
use townhall_portal::models::{
    NewTown, NotificationFilter, OfficialPermissions, PasswordChange, ProfileUpdate, Role,
    SignupRequest, TownChangeSubmission,
};
use townhall_portal::{AppError, AppResult, PortalState};

#[derive(Parser)]
#[command(name = "townhall-portal")]
#[command(about = "Townhall civic portal client", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in to a portal
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Portal to sign in to (citizen, business, government)
        #[arg(short, long, default_value = "citizen")]
        role: Role,
    },

    /// Register a new account
    Signup(SignupArgs),

    /// Sign out of the current session
    Logout,

    /// Show the current session
    Whoami,

    /// Validate the stored token again after a connectivity problem
    RetryProfile,

    /// Update name or phone number of the signed-in user
    UpdateProfile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Change the password of the signed-in user
    ChangePassword {
        #[arg(long)]
        old_password: String,
        #[arg(long)]
        new_password: String,
        #[arg(long)]
        confirm_password: String,
    },

    /// Ask to move the signed-in account to another town
    RequestTownChange {
        #[arg(value_name = "TOWN_ID")]
        town_id: i64,
        #[arg(long)]
        billing_address: String,
    },

    /// Show what the route guards decide for a portal path
    Visit {
        #[arg(value_name = "ROUTE")]
        route: String,
    },

    /// Sign in to the admin area
    AdminLogin {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Sign out of the admin area
    AdminLogout,

    /// Check the stored admin token against the server
    AdminVerify,

    /// Administrative operations (requires an admin session)
    #[command(subcommand)]
    Admin(AdminCommands),

    /// List active towns
    Towns,

    /// List notifications of the signed-in citizen
    Notifications {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },

    /// Mark a notification as read
    ReadNotification {
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// List complaints of the signed-in citizen
    Complaints,

    /// Probe the backend API
    CheckConnection,
}

#[derive(Args)]
pub struct SignupArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long, default_value = "citizen")]
    role: Role,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    town_id: Option<i64>,
    #[arg(long)]
    street_address: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    zip_code: Option<String>,
    #[arg(long)]
    business_name: Option<String>,
    #[arg(long)]
    business_type: Option<String>,
    #[arg(long)]
    employee_id: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    position: Option<String>,
}

impl From<SignupArgs> for SignupRequest {
    fn from(args: SignupArgs) -> Self {
        Self {
            email: args.email,
            password: args.password,
            first_name: args.first_name,
            last_name: args.last_name,
            phone: args.phone,
            user_type: Some(args.role),
            town_id: args.town_id,
            street_address: args.street_address,
            city: args.city,
            state: args.state,
            zip_code: args.zip_code,
            business_name: args.business_name,
            business_type: args.business_type,
            employee_id: args.employee_id,
            department: args.department,
            position: args.position,
            ..Self::default()
        }
    }
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// List all users
    Users,
    /// List users awaiting approval
    Pending,
    /// Approve a pending user
    Approve {
        #[arg(value_name = "USER_ID")]
        user_id: i64,
    },
    /// Reject a pending user
    Reject {
        #[arg(value_name = "USER_ID")]
        user_id: i64,
    },
    /// List government officials
    Officials,
    /// Set permissions of a government official
    SetPermissions {
        #[arg(value_name = "OFFICIAL_ID")]
        official_id: i64,
        #[arg(long)]
        can_view_users: bool,
        #[arg(long)]
        can_approve_users: bool,
    },
    /// List active towns
    Towns,
    /// Add a town
    CreateTown {
        #[arg(long)]
        name: String,
        #[arg(long)]
        state: String,
        /// Comma-separated zip codes
        #[arg(long, default_value = "")]
        zip_codes: String,
    },
    /// List town change requests
    ChangeRequests,
    /// Approve a town change request
    ApproveChange {
        #[arg(value_name = "REQUEST_ID")]
        request_id: i64,
    },
    /// Reject a town change request
    RejectChange {
        #[arg(value_name = "REQUEST_ID")]
        request_id: i64,
        #[arg(long, default_value = "")]
        reason: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn auth_failure(failure: AuthFailure) -> AppError {
    for field in failure.details.iter().flat_map(|details| details.fields()) {
        for message in failure.field_messages(field) {
            eprintln!("  {field}: {message}");
        }
    }
    if failure.is_retryable() {
        eprintln!("Nothing was changed; try again once the server responds.");
    }
    match failure.kind {
        FailureKind::Validation => AppError::ValidationError(failure.message),
        FailureKind::Unreachable => AppError::NetworkError(failure.message),
        FailureKind::InvalidResponse => AppError::InvalidResponse(failure.message),
        FailureKind::PendingApproval => AppError::PendingApproval(failure.message),
        FailureKind::Storage => AppError::StorageError(failure.message),
        FailureKind::Server => AppError::ExternalServiceError(failure.message),
        FailureKind::InvalidCredentials | FailureKind::RoleMismatch | FailureKind::Forbidden => {
            AppError::AuthError(failure.message)
        }
    }
}

fn describe_session(snapshot: &SessionSnapshot) {
    match (&snapshot.user, snapshot.is_authenticated()) {
        (Some(user), true) => {
            let role = user.effective_role().map_or("unknown", Role::as_str);
            println!("Signed in as {} <{}> ({})", user.full_name(), user.email, role);
        }
        _ if snapshot.token.is_some() => {
            println!("Session could not be verified. Run `retry-profile` once the server is reachable.");
            if let Some(error) = &snapshot.last_error {
                println!("  Last error: {error}");
            }
        }
        _ => println!("Not signed in"),
    }
}

pub async fn run(state: &PortalState, command: Commands) -> AppResult<()> {
    match command {
        Commands::Login {
            email,
            password,
            role,
        } => {
            let user = state
                .session
                .login(&email, &password, role)
                .await
                .map_err(auth_failure)?;
            println!("Signed in as {} <{}>", user.full_name(), user.email);
        }
        Commands::Signup(args) => {
            let request = SignupRequest::from(args);
            match state.session.signup(&request).await.map_err(auth_failure)? {
                SignupOutcome::SignedIn(user) => println!("Account created, signed in as {}", user.email),
                SignupOutcome::PendingApproval { message, .. } => println!("{message}"),
            }
        }
        Commands::Logout => {
            state.session.restore_token().await;
            state.session.logout().await;
            println!("Signed out");
        }
        Commands::Whoami => {
            let snapshot = state.session.initialize().await;
            describe_session(&snapshot);
        }
        Commands::RetryProfile => {
            state.session.initialize().await;
            match state.session.retry_profile().await {
                ProfileFetchOutcome::Validated(user) => println!("Session verified for {}", user.email),
                ProfileFetchOutcome::Invalidated => println!("Session expired. Please sign in again."),
                ProfileFetchOutcome::Unavailable(e) => return Err(e),
                ProfileFetchOutcome::Superseded | ProfileFetchOutcome::NoSession => {
                    println!("Not signed in");
                }
            }
        }
        Commands::UpdateProfile {
            first_name,
            last_name,
            phone,
        } => {
            state.session.initialize().await;
            let update = ProfileUpdate {
                first_name,
                last_name,
                phone_number: phone,
            };
            let user = state.session.update_profile(&update).await?;
            println!("Profile updated for {}", user.email);
        }
        Commands::ChangePassword {
            old_password,
            new_password,
            confirm_password,
        } => {
            state.session.initialize().await;
            let change = PasswordChange {
                old_password,
                new_password,
                confirm_password,
            };
            let ack = state
                .client
                .change_password(&state.require_token()?, &change)
                .await?;
            println!("{}", ack.message.unwrap_or_else(|| "Password changed".to_string()));
        }
        Commands::RequestTownChange {
            town_id,
            billing_address,
        } => {
            state.session.initialize().await;
            let submission = TownChangeSubmission {
                requested_town_id: town_id,
                billing_address,
            };
            let receipt = state
                .client
                .submit_town_change(&state.require_token()?, &submission)
                .await?;
            match receipt.request_id {
                Some(id) => println!("Town change request {id} submitted, pending approval"),
                None => println!("Town change request submitted, pending approval"),
            }
        }
        Commands::Visit { route } => {
            state.session.initialize().await;
            match state.visit(&route).await {
                GuardDecision::Authorized => println!("{route}: access granted"),
                GuardDecision::Redirect(target) => println!("{route}: redirect to {target}"),
                GuardDecision::Pending => println!("{route}: still loading"),
            }
        }
        Commands::AdminLogin { email, password } => {
            let user = state
                .admin
                .login(&email, &password)
                .await
                .map_err(auth_failure)?;
            println!("Admin session started for {}", user.email);
        }
        Commands::AdminLogout => {
            state.admin.logout().await;
            println!("Admin signed out");
        }
        Commands::AdminVerify => match state.admin.verify().await {
            AdminVerification::Verified(user) => println!("Admin session valid for {}", user.email),
            AdminVerification::Revoked => println!("Admin session revoked. Please sign in again."),
            AdminVerification::Unavailable(e) => return Err(e),
            AdminVerification::NotSignedIn => println!("No admin session"),
        },
        Commands::Admin(admin_command) => run_admin(state, admin_command).await?,
        Commands::Towns => print_json(&state.client.active_towns().await?)?,
        Commands::Notifications { unread } => {
            state.session.initialize().await;
            let filter = NotificationFilter {
                is_read: unread.then_some(false),
            };
            let list = state.client.notifications(&state.require_token()?, filter).await?;
            print_json(&list)?;
        }
        Commands::ReadNotification { id } => {
            state.session.initialize().await;
            state
                .client
                .mark_notification_read(&state.require_token()?, id)
                .await?;
            println!("Notification {id} marked as read");
        }
        Commands::Complaints => {
            state.session.initialize().await;
            print_json(&state.client.complaints(&state.require_token()?).await?)?;
        }
        Commands::CheckConnection => match state.client.check_connection().await {
            BackendStatus::Online => println!("Backend API is reachable at {}", state.config.api_base_url),
            BackendStatus::Offline => {
                return Err(AppError::NetworkError(format!(
                    "Backend API is not reachable at {}",
                    state.config.api_base_url
                )));
            }
        },
    }
    Ok(())
}

async fn admin_token(state: &PortalState) -> AppResult<String> {
    match state.admin.verify().await {
        AdminVerification::Verified(user) => {
            info!("Acting as admin {}", user.email);
            state
                .admin
                .token()
                .await
                .ok_or_else(|| AppError::AuthError("Admin session disappeared".to_string()))
        }
        AdminVerification::Revoked => Err(AppError::AuthError(
            "Admin session revoked. Run `admin-login` again.".to_string(),
        )),
        AdminVerification::NotSignedIn => Err(AppError::AuthError(
            "No admin session. Run `admin-login` first.".to_string(),
        )),
        AdminVerification::Unavailable(e) => Err(e),
    }
}

async fn run_admin(state: &PortalState, command: AdminCommands) -> AppResult<()> {
    let token = admin_token(state).await?;
    let client = &state.client;

    match command {
        AdminCommands::Users => print_json(&client.list_all_users(&token).await?)?,
        AdminCommands::Pending => print_json(&client.list_pending_users(&token).await?)?,
        AdminCommands::Approve { user_id } => {
            let ack = client.approve_user(&token, user_id).await?;
            println!("{}", ack.message.unwrap_or_else(|| format!("User {user_id} approved")));
        }
        AdminCommands::Reject { user_id } => {
            let ack = client.reject_user(&token, user_id).await?;
            println!("{}", ack.message.unwrap_or_else(|| format!("User {user_id} rejected")));
        }
        AdminCommands::Officials => print_json(&client.list_officials(&token).await?)?,
        AdminCommands::SetPermissions {
            official_id,
            can_view_users,
            can_approve_users,
        } => {
            let permissions = OfficialPermissions {
                can_view_users,
                can_approve_users,
            };
            client
                .update_official_permissions(&token, official_id, permissions)
                .await?;
            println!("Permissions updated for official {official_id}");
        }
        AdminCommands::Towns => print_json(&client.active_towns().await?)?,
        AdminCommands::CreateTown {
            name,
            state: town_state,
            zip_codes,
        } => {
            let town = NewTown::from_input(&name, &town_state, &zip_codes);
            client.create_town(&token, &town).await?;
            println!("Town {} created", town.name);
        }
        AdminCommands::ChangeRequests => print_json(&client.town_change_requests(&token).await?)?,
        AdminCommands::ApproveChange { request_id } => {
            client.approve_town_change(&token, request_id).await?;
            println!("Change request {request_id} approved");
        }
        AdminCommands::RejectChange { request_id, reason } => {
            client.reject_town_change(&token, request_id, &reason).await?;
            println!("Change request {request_id} rejected");
        }
    }
    Ok(())
}
