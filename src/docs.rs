use crate::api::attendance::{LogListResponse, LogQuery, SubmitLog, SubmitLogResponse};
use crate::api::employee::{
    BadgeResponse, CreateEmployee, EmployeeListResponse, EmployeeQuery, IdentifyReq,
};
use crate::api::announcement::CreateAnnouncement;
use crate::api::company::UpdateCompany;
use crate::api::department::DepartmentReq;
use crate::api::file::CreateFile;
use crate::api::message::{MessageListResponse, SendMessage};
use crate::api::report::{CreateReport, ReportListResponse};
use crate::model::announcement::Announcement;
use crate::model::attendance::{AttendanceLog, AttendanceStatus, Direction};
use crate::model::badge::BadgePayload;
use crate::model::company::CompanyConfig;
use crate::model::coordinate::Coordinate;
use crate::model::department::Department;
use crate::model::employee::{Employee, Role};
use crate::model::file_entry::FileEntry;
use crate::model::message::ChatMessage;
use crate::model::report::ReportEntry;
use crate::models::{ActivateReq, LoginReq, TokenPair};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fieldpunch API",
        version = "1.0.0",
        description = r#"
## Field-Workforce Attendance Service

Backend for a field-workforce attendance and reporting application: workers
check in and out with a photo and a GPS position, submit field reports, and
chat within their department; administrators manage employees, departments,
announcements, shared files, and company branding.

### 🔹 Key Features
- **Attendance**
  - Photo + location check-in/check-out, geofenced server-side
  - Filtered log listing (the OUT_OF_BOUNDS filter backs the alerts counter)
  - CSV export for reporting
- **Employees**
  - CRUD, badge QR payloads, badge-based identification
  - Phone-number activation flow for first-time logins
- **Department surfaces**
  - Reports, chat messages, shared files, announcements

### 🔐 Security
Endpoints under `/api` require **JWT Bearer authentication**. Login is by
phone number; refresh tokens rotate on use.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::activate,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::submit_log,
        crate::api::attendance::list_logs,
        crate::api::attendance::export_csv,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::badge,
        crate::api::employee::identify,

        crate::api::department::list_departments,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::report::list_reports,
        crate::api::report::create_report,

        crate::api::message::list_messages,
        crate::api::message::send_message,

        crate::api::file::list_files,
        crate::api::file::create_file,
        crate::api::file::delete_file,

        crate::api::announcement::list_announcements,
        crate::api::announcement::create_announcement,
        crate::api::announcement::delete_announcement,

        crate::api::company::get_company,
        crate::api::company::update_company
    ),
    components(
        schemas(
            LoginReq,
            ActivateReq,
            TokenPair,
            SubmitLog,
            SubmitLogResponse,
            LogQuery,
            LogListResponse,
            AttendanceLog,
            AttendanceStatus,
            Direction,
            Coordinate,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            Employee,
            Role,
            BadgeResponse,
            BadgePayload,
            IdentifyReq,
            Department,
            DepartmentReq,
            ReportEntry,
            CreateReport,
            ReportListResponse,
            ChatMessage,
            SendMessage,
            MessageListResponse,
            FileEntry,
            CreateFile,
            Announcement,
            CreateAnnouncement,
            CompanyConfig,
            UpdateCompany
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, activation, and token APIs"),
        (name = "Attendance", description = "Attendance log APIs"),
        (name = "Employee", description = "Employee management and badge APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "Report", description = "Field report APIs"),
        (name = "Chat", description = "Department chat APIs"),
        (name = "File", description = "Shared file APIs"),
        (name = "Announcement", description = "Announcement APIs"),
        (name = "Company", description = "Company branding APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
