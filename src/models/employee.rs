use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::errors::AppError;
use crate::utils::validation::{validate_employee_type, validate_payload, validate_salary, validate_status};

/// Values accepted for `employeeType`.
pub const EMPLOYEE_TYPES: &[&str] = &["Full-time", "Part-time", "Contract", "Intern"];

/// Values accepted for `status`.
pub const EMPLOYEE_STATUSES: &[&str] = &["Active", "Inactive"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmployeeType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Intern,
}

impl EmployeeType {
    pub const ALL: [EmployeeType; 4] = [
        EmployeeType::FullTime,
        EmployeeType::PartTime,
        EmployeeType::Contract,
        EmployeeType::Intern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeType::FullTime => "Full-time",
            EmployeeType::PartTime => "Part-time",
            EmployeeType::Contract => "Contract",
            EmployeeType::Intern => "Intern",
        }
    }
}

impl FromStr for EmployeeType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("`{}` is not a valid employeeType", s)))
    }
}

impl fmt::Display for EmployeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "Active",
            EmployeeStatus::Inactive => "Inactive",
        }
    }
}

impl FromStr for EmployeeStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(EmployeeStatus::Active),
            "Inactive" => Ok(EmployeeStatus::Inactive),
            other => Err(AppError::Validation(format!("`{}` is not a valid status", other))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub employee_type: EmployeeType,
    pub department: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    pub joining_date: NaiveDate,
    pub salary: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    pub status: EmployeeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn create(new_employee: NewEmployee, now: DateTime<Utc>) -> Self {
        Employee {
            id: Uuid::new_v4(),
            first_name: new_employee.first_name,
            last_name: new_employee.last_name,
            email: new_employee.email,
            phone: new_employee.phone,
            employee_type: new_employee.employee_type,
            department: new_employee.department,
            position: new_employee.position,
            profile_picture: new_employee.profile_picture,
            joining_date: new_employee.joining_date,
            salary: new_employee.salary,
            address: new_employee.address,
            status: new_employee.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Shallow merge: every supplied field overwrites the stored one, and a
    /// supplied address replaces the previous address as a whole.
    pub fn apply(&mut self, changes: EmployeeChanges, now: DateTime<Utc>) {
        if let Some(first_name) = changes.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            self.last_name = last_name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if let Some(phone) = changes.phone {
            self.phone = phone;
        }
        if let Some(employee_type) = changes.employee_type {
            self.employee_type = employee_type;
        }
        if let Some(department) = changes.department {
            self.department = department;
        }
        if let Some(position) = changes.position {
            self.position = position;
        }
        if let Some(profile_picture) = changes.profile_picture {
            self.profile_picture = Some(profile_picture);
        }
        if let Some(joining_date) = changes.joining_date {
            self.joining_date = joining_date;
        }
        if let Some(salary) = changes.salary {
            self.salary = salary;
        }
        if let Some(address) = changes.address {
            self.address = Some(address);
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_at = now;
    }

    /// Case-insensitive substring match over the searchable fields.
    /// `needle` must already be lower-cased.
    pub fn matches(&self, needle: &str) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.department,
            &self.position,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A fully validated record ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub employee_type: EmployeeType,
    pub department: String,
    pub position: String,
    pub profile_picture: Option<String>,
    pub joining_date: NaiveDate,
    pub salary: f64,
    pub address: Option<Address>,
    pub status: EmployeeStatus,
}

/// Validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// `Some(None)` clears the stored phone.
    pub phone: Option<Option<String>>,
    pub employee_type: Option<EmployeeType>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub profile_picture: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub address: Option<Address>,
    pub status: Option<EmployeeStatus>,
}

/// Raw employee fields as submitted by a client, before normalization.
///
/// Used for both create and update bodies; `profilePicture` is never taken
/// from the client and is filled in by the upload handling instead.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeForm {
    #[validate(length(min = 1, message = "firstName cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "lastName cannot be empty"))]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "email cannot be empty"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(custom = "validate_employee_type")]
    pub employee_type: Option<String>,
    #[validate(length(min = 1, message = "department cannot be empty"))]
    pub department: Option<String>,
    #[validate(length(min = 1, message = "position cannot be empty"))]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "deserialize_joining_date")]
    pub joining_date: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub address: Option<Address>,
    #[validate(custom = "validate_status")]
    pub status: Option<String>,
}

impl EmployeeForm {
    /// Trims text fields and lower-cases the email. A blank phone stays
    /// `Some("")` so an update can tell "cleared" from "not sent".
    pub fn normalized(self) -> Self {
        let trim = |value: Option<String>| value.map(|v| v.trim().to_string());
        EmployeeForm {
            first_name: trim(self.first_name),
            last_name: trim(self.last_name),
            email: trim(self.email).map(|email| email.to_lowercase()),
            phone: trim(self.phone),
            employee_type: trim(self.employee_type),
            department: trim(self.department),
            position: trim(self.position),
            joining_date: self.joining_date,
            salary: self.salary,
            address: self.address,
            status: trim(self.status),
        }
    }
}

fn missing(field: &str) -> AppError {
    AppError::Validation(format!("{} is required", field))
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(missing(field)),
    }
}

impl TryFrom<EmployeeForm> for NewEmployee {
    type Error = AppError;

    fn try_from(form: EmployeeForm) -> Result<Self, Self::Error> {
        let form = form.normalized();
        validate_payload(&form)?;

        Ok(NewEmployee {
            first_name: required(form.first_name, "firstName")?,
            last_name: required(form.last_name, "lastName")?,
            email: required(form.email, "email")?,
            phone: form.phone.filter(|phone| !phone.is_empty()),
            employee_type: required(form.employee_type, "employeeType")?.parse::<EmployeeType>()?,
            department: required(form.department, "department")?,
            position: required(form.position, "position")?,
            profile_picture: None,
            joining_date: form.joining_date.ok_or_else(|| missing("joiningDate"))?,
            salary: validate_salary(form.salary.ok_or_else(|| missing("salary"))?)?,
            address: form.address,
            status: form
                .status
                .as_deref()
                .map(str::parse::<EmployeeStatus>)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl TryFrom<EmployeeForm> for EmployeeChanges {
    type Error = AppError;

    fn try_from(form: EmployeeForm) -> Result<Self, Self::Error> {
        let form = form.normalized();
        validate_payload(&form)?;

        Ok(EmployeeChanges {
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            phone: form.phone.map(|phone| Some(phone).filter(|phone| !phone.is_empty())),
            employee_type: form.employee_type.as_deref().map(str::parse::<EmployeeType>).transpose()?,
            department: form.department,
            position: form.position,
            profile_picture: None,
            joining_date: form.joining_date,
            salary: form.salary.map(validate_salary).transpose()?,
            address: form.address,
            status: form.status.as_deref().map(str::parse::<EmployeeStatus>).transpose()?,
        })
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping only the date.
pub fn parse_joining_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::Validation(format!("joiningDate `{}` is not a valid date", raw)))
}

fn deserialize_joining_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| parse_joining_date(&value))
        .transpose()
        .map_err(|err| serde::de::Error::custom(err.message().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> EmployeeForm {
        EmployeeForm {
            first_name: Some("  Ada ".into()),
            last_name: Some("Lovelace".into()),
            email: Some(" Ada@Example.COM ".into()),
            phone: Some("   ".into()),
            employee_type: Some("Full-time".into()),
            department: Some("Engineering".into()),
            position: Some("Analyst".into()),
            joining_date: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            salary: Some(5000.0),
            address: None,
            status: None,
        }
    }

    #[test]
    fn enum_sets_match_variants() {
        for employee_type in EmployeeType::ALL {
            assert!(EMPLOYEE_TYPES.contains(&employee_type.as_str()));
            assert_eq!(employee_type.as_str().parse::<EmployeeType>().unwrap(), employee_type);
        }
        assert_eq!(EMPLOYEE_TYPES.len(), EmployeeType::ALL.len());
        for status in EMPLOYEE_STATUSES {
            assert_eq!(status.parse::<EmployeeStatus>().unwrap().as_str(), *status);
        }
    }

    #[test]
    fn new_employee_is_normalized() {
        let employee = NewEmployee::try_from(complete_form()).unwrap();
        assert_eq!(employee.first_name, "Ada");
        assert_eq!(employee.email, "ada@example.com");
        assert_eq!(employee.phone, None);
        assert_eq!(employee.status, EmployeeStatus::Active);
        assert_eq!(employee.employee_type, EmployeeType::FullTime);
    }

    #[test]
    fn new_employee_requires_fields() {
        let mut form = complete_form();
        form.position = None;
        let err = NewEmployee::try_from(form).unwrap_err();
        assert_eq!(err.message(), "position is required");

        let mut form = complete_form();
        form.salary = None;
        assert!(matches!(NewEmployee::try_from(form), Err(AppError::Validation(_))));
    }

    #[test]
    fn blank_required_text_is_rejected() {
        let mut form = complete_form();
        form.last_name = Some("   ".into());
        assert!(matches!(NewEmployee::try_from(form), Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_employee_type_is_rejected() {
        let mut form = complete_form();
        form.employee_type = Some("Freelance".into());
        assert!(matches!(NewEmployee::try_from(form), Err(AppError::Validation(_))));
    }

    #[test]
    fn negative_salary_is_rejected() {
        let mut form = complete_form();
        form.salary = Some(-10.0);
        assert!(matches!(NewEmployee::try_from(form), Err(AppError::Validation(_))));
    }

    #[test]
    fn changes_only_carry_supplied_fields() {
        let form = EmployeeForm {
            status: Some("Inactive".into()),
            email: Some("NEW@example.com".into()),
            ..Default::default()
        };
        let changes = EmployeeChanges::try_from(form).unwrap();
        assert_eq!(changes.status, Some(EmployeeStatus::Inactive));
        assert_eq!(changes.email.as_deref(), Some("new@example.com"));
        assert!(changes.first_name.is_none());
        assert!(changes.salary.is_none());
        assert!(changes.phone.is_none());
    }

    #[test]
    fn blank_phone_clears_on_update() {
        let mut employee = Employee::create(NewEmployee::try_from(complete_form()).unwrap(), Utc::now());
        employee.phone = Some("555-0100".into());

        let untouched = EmployeeChanges::try_from(EmployeeForm::default()).unwrap();
        employee.apply(untouched, Utc::now());
        assert_eq!(employee.phone.as_deref(), Some("555-0100"));

        let form = EmployeeForm { phone: Some("  ".into()), ..Default::default() };
        let changes = EmployeeChanges::try_from(form).unwrap();
        assert_eq!(changes.phone, Some(None));
        employee.apply(changes, Utc::now());
        assert_eq!(employee.phone, None);

        let form = EmployeeForm { phone: Some(" 555-0199 ".into()), ..Default::default() };
        employee.apply(EmployeeChanges::try_from(form).unwrap(), Utc::now());
        assert_eq!(employee.phone.as_deref(), Some("555-0199"));
    }

    #[test]
    fn apply_replaces_address_wholesale() {
        let mut employee = Employee::create(NewEmployee::try_from(complete_form()).unwrap(), Utc::now());
        employee.address = Some(Address {
            street: Some("1 Main St".into()),
            city: Some("Springfield".into()),
            ..Default::default()
        });
        let created_at = employee.created_at;

        let later = created_at + chrono::Duration::seconds(5);
        employee.apply(
            EmployeeChanges {
                address: Some(Address { country: Some("UK".into()), ..Default::default() }),
                ..Default::default()
            },
            later,
        );

        let address = employee.address.unwrap();
        assert_eq!(address.country.as_deref(), Some("UK"));
        assert!(address.street.is_none());
        assert!(address.city.is_none());
        assert_eq!(employee.created_at, created_at);
        assert_eq!(employee.updated_at, later);
    }

    #[test]
    fn matches_is_case_insensitive_across_fields() {
        let employee = Employee::create(NewEmployee::try_from(complete_form()).unwrap(), Utc::now());
        assert!(employee.matches("eng"));
        assert!(employee.matches("love"));
        assert!(employee.matches("example.com"));
        assert!(!employee.matches("sales"));
    }

    #[test]
    fn joining_date_accepts_date_or_timestamp() {
        let expected = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(parse_joining_date("2023-12-31").unwrap(), expected);
        assert_eq!(parse_joining_date("2023-12-31T08:00:00Z").unwrap(), expected);
        assert!(parse_joining_date("last tuesday").is_err());
    }

    #[test]
    fn json_form_deserializes_camel_case() {
        let form: EmployeeForm = serde_json::from_str(
            r#"{"firstName":"Grace","employeeType":"Intern","joiningDate":"2022-01-15","salary":12.5,
                "address":{"zipCode":"12345"}}"#,
        )
        .unwrap();
        assert_eq!(form.first_name.as_deref(), Some("Grace"));
        assert_eq!(form.joining_date, NaiveDate::from_ymd_opt(2022, 1, 15));
        assert_eq!(form.address.unwrap().zip_code.as_deref(), Some("12345"));
    }
}
