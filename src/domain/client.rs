// Copyright 2025 Cowboy AI, LLC.

//! Clients, their budget accounting and agreement signing

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{AgreementId, ClientId, ClientMarker, Document, UserId};
use crate::errors::{DomainError, DomainResult};

/// Spend classification of a client budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BudgetStatus {
    /// Spend below budget
    #[default]
    Active,
    /// Spend above budget
    Exceeded,
    /// Spend exactly at budget
    Completed,
    /// Kept for stored data; never derived
    Suspended,
}

impl BudgetStatus {
    /// Derive from spend versus total.
    ///
    /// A zero total with any spend counts as exceeded; zero against zero is active.
    pub fn derive(spent: Decimal, total: Decimal) -> Self {
        if total.is_zero() {
            return if spent > Decimal::ZERO {
                BudgetStatus::Exceeded
            } else {
                BudgetStatus::Active
            };
        }
        match spent.cmp(&total) {
            std::cmp::Ordering::Greater => BudgetStatus::Exceeded,
            std::cmp::Ordering::Equal => BudgetStatus::Completed,
            std::cmp::Ordering::Less => BudgetStatus::Active,
        }
    }
}

/// How a spend amount is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetOperation {
    /// Add to spend
    Add,
    /// Subtract from spend, floored at zero
    Subtract,
    /// Replace spend
    Set,
}

impl std::str::FromStr for BudgetOperation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(BudgetOperation::Add),
            "subtract" => Ok(BudgetOperation::Subtract),
            "set" => Ok(BudgetOperation::Set),
            other => Err(DomainError::ValidationError(format!(
                "unknown budget operation: {other}"
            ))),
        }
    }
}

/// Budget figures of a client
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetInfo {
    total_budget: Decimal,
    allocated_budget: Decimal,
    spent_budget: Decimal,
    budget_status: BudgetStatus,
}

impl BudgetInfo {
    /// Budget with nothing spent yet
    pub fn new(total_budget: Decimal, allocated_budget: Decimal) -> Self {
        Self {
            total_budget,
            allocated_budget,
            spent_budget: Decimal::ZERO,
            budget_status: BudgetStatus::derive(Decimal::ZERO, total_budget),
        }
    }

    /// Agreed total
    pub fn total_budget(&self) -> Decimal {
        self.total_budget
    }

    /// Amount allocated to projects
    pub fn allocated_budget(&self) -> Decimal {
        self.allocated_budget
    }

    /// Amount spent
    pub fn spent_budget(&self) -> Decimal {
        self.spent_budget
    }

    /// Derived status
    pub fn budget_status(&self) -> BudgetStatus {
        self.budget_status
    }

    /// Total minus spend; negative when exceeded
    pub fn remaining_budget(&self) -> Decimal {
        self.total_budget - self.spent_budget
    }

    /// Spend as a percentage of total, `None` when there is no total
    pub fn utilization(&self) -> DomainResult<Option<Decimal>> {
        if self.total_budget.is_zero() {
            return Ok(None);
        }
        self.spent_budget
            .checked_div(self.total_budget)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(Some)
            .ok_or_else(|| DomainError::overflow("budget utilization"))
    }

    /// Apply a spend change and re-derive the status.
    pub fn apply(&mut self, amount: Decimal, operation: BudgetOperation) -> DomainResult<()> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation("spent amount must not be negative"));
        }
        self.spent_budget = match operation {
            BudgetOperation::Add => self
                .spent_budget
                .checked_add(amount)
                .ok_or_else(|| DomainError::overflow("spent budget"))?,
            BudgetOperation::Subtract => (self.spent_budget - amount).max(Decimal::ZERO),
            BudgetOperation::Set => amount,
        };
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        self.budget_status = BudgetStatus::derive(self.spent_budget, self.total_budget);
    }
}

/// Lifecycle of an agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgreementStatus {
    /// Being written
    #[default]
    Draft,
    /// Sent for signature
    Pending,
    /// Signed by both parties
    Signed,
    /// Past its end date
    Expired,
    /// Ended early
    Terminated,
}

/// Which party is signing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureParty {
    /// The client
    Client,
    /// The construction company
    Company,
}

/// A captured signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Printed name of the signer
    pub name: String,
    /// Signature payload (typically an encoded image)
    pub signature: String,
    /// When it was captured
    pub date: DateTime<Utc>,
    /// Company user who signed; only recorded for company signatures
    pub signed_by: Option<UserId>,
}

/// Signatures collected so far
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signatures {
    /// Client signature
    pub client: Option<Signature>,
    /// Company signature
    pub company: Option<Signature>,
}

impl Signatures {
    /// Both parties have signed
    pub fn is_complete(&self) -> bool {
        self.client.is_some() && self.company.is_some()
    }
}

/// Input for adding an agreement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewAgreement {
    /// Title
    pub title: String,
    /// Body or summary
    pub description: Option<String>,
    /// Contract value
    pub value: Option<Decimal>,
    /// Start of validity
    pub start_date: Option<DateTime<Utc>>,
    /// End of validity
    pub end_date: Option<DateTime<Utc>>,
    /// Initial status; defaults to `Draft`
    pub status: Option<AgreementStatus>,
}

/// A contract with a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    id: AgreementId,
    /// Title
    pub title: String,
    /// Body or summary
    pub description: Option<String>,
    /// Contract value
    pub value: Option<Decimal>,
    /// Start of validity
    pub start_date: Option<DateTime<Utc>>,
    /// End of validity
    pub end_date: Option<DateTime<Utc>>,
    status: AgreementStatus,
    signed_by: Signatures,
    signed_date: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Agreement {
    /// Validate and build an unsigned agreement.
    pub fn new(input: NewAgreement, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.title.trim().is_empty() {
            return Err(DomainError::validation("agreement title is required"));
        }
        let status = input.status.unwrap_or_default();
        if status == AgreementStatus::Signed {
            return Err(DomainError::validation(
                "an agreement only becomes Signed once both parties sign",
            ));
        }
        if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
            if end < start {
                return Err(DomainError::validation("agreement ends before it starts"));
            }
        }

        Ok(Self {
            id: AgreementId::new(),
            title: input.title,
            description: input.description,
            value: input.value,
            start_date: input.start_date,
            end_date: input.end_date,
            status,
            signed_by: Signatures::default(),
            signed_date: None,
            created_at: now,
        })
    }

    /// Agreement id
    pub fn id(&self) -> AgreementId {
        self.id
    }

    /// Current status
    pub fn status(&self) -> AgreementStatus {
        self.status
    }

    /// Collected signatures
    pub fn signed_by(&self) -> &Signatures {
        &self.signed_by
    }

    /// When the second signature completed the agreement
    pub fn signed_date(&self) -> Option<DateTime<Utc>> {
        self.signed_date
    }

    /// Record a signature; the agreement becomes `Signed` once both parties
    /// have signed and stays so.
    pub fn sign(
        &mut self,
        party: SignatureParty,
        signature_data: String,
        signer_name: String,
        signed_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if signer_name.trim().is_empty() {
            return Err(DomainError::validation("signer name is required"));
        }
        if signature_data.is_empty() {
            return Err(DomainError::validation("signature data is required"));
        }

        let signature = Signature {
            name: signer_name,
            signature: signature_data,
            date: now,
            signed_by: match party {
                SignatureParty::Company => signed_by,
                SignatureParty::Client => None,
            },
        };
        match party {
            SignatureParty::Client => self.signed_by.client = Some(signature),
            SignatureParty::Company => self.signed_by.company = Some(signature),
        }

        if self.signed_by.is_complete() && self.status != AgreementStatus::Signed {
            self.status = AgreementStatus::Signed;
            self.signed_date = Some(now);
        }
        Ok(())
    }
}

/// Input for creating a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    /// Contact or company name
    pub name: String,
    /// Unique email
    pub email: String,
    /// Phone number
    pub phone: Option<String>,
    /// Company name
    pub company: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Agreed total budget
    pub total_budget: Decimal,
    /// Budget allocated to projects
    pub allocated_budget: Decimal,
}

/// Changes to a client's contact data and budget ceiling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientPatch {
    /// New name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New phone
    pub phone: Option<String>,
    /// New company
    pub company: Option<String>,
    /// New address
    pub address: Option<String>,
    /// New total budget
    pub total_budget: Option<Decimal>,
    /// New allocated budget
    pub allocated_budget: Option<Decimal>,
}

/// A customer of the construction company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    id: ClientId,
    /// Contact or company name
    pub name: String,
    email: String,
    /// Phone number
    pub phone: Option<String>,
    /// Company name
    pub company: Option<String>,
    /// Postal address
    pub address: Option<String>,
    agreements: Vec<Agreement>,
    budget_info: BudgetInfo,
    version: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Validate and build a client.
    pub fn new(input: NewClient, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("client name is required"));
        }
        let email = normalize_email(&input.email)?;
        non_negative_budget(input.total_budget, input.allocated_budget)?;

        Ok(Self {
            id: ClientId::new(),
            name: input.name,
            email,
            phone: input.phone,
            company: input.company,
            address: input.address,
            agreements: Vec::new(),
            budget_info: BudgetInfo::new(input.total_budget, input.allocated_budget),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Normalized email
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Agreements in creation order
    pub fn agreements(&self) -> &[Agreement] {
        &self.agreements
    }

    /// Look up an agreement
    pub fn agreement(&self, id: AgreementId) -> Option<&Agreement> {
        self.agreements.iter().find(|a| a.id == id)
    }

    /// Budget figures
    pub fn budget_info(&self) -> &BudgetInfo {
        &self.budget_info
    }

    /// Apply a spend change.
    pub fn update_budget(
        &mut self,
        amount: Decimal,
        operation: BudgetOperation,
    ) -> DomainResult<()> {
        self.budget_info.apply(amount, operation)
    }

    /// Append an agreement and return its id.
    pub fn add_agreement(
        &mut self,
        input: NewAgreement,
        now: DateTime<Utc>,
    ) -> DomainResult<AgreementId> {
        let agreement = Agreement::new(input, now)?;
        let id = agreement.id;
        self.agreements.push(agreement);
        Ok(id)
    }

    /// Sign one side of an agreement.
    pub fn sign_agreement(
        &mut self,
        agreement_id: AgreementId,
        party: SignatureParty,
        signature_data: String,
        signer_name: String,
        signed_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> DomainResult<&Agreement> {
        let client_id = self.id;
        let agreement = self
            .agreements
            .iter_mut()
            .find(|a| a.id == agreement_id)
            .ok_or_else(|| DomainError::AgreementNotFound {
                client: client_id.to_string(),
                agreement: agreement_id.to_string(),
            })?;
        agreement.sign(party, signature_data, signer_name, signed_by, now)?;
        Ok(agreement)
    }

    /// Apply contact and budget-ceiling changes; the budget status is re-derived.
    pub fn apply_patch(&mut self, patch: ClientPatch) -> DomainResult<()> {
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("client name is required"));
            }
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = normalize_email(&email)?;
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(company) = patch.company {
            self.company = Some(company);
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
        let total = patch.total_budget.unwrap_or(self.budget_info.total_budget);
        let allocated = patch
            .allocated_budget
            .unwrap_or(self.budget_info.allocated_budget);
        non_negative_budget(total, allocated)?;
        self.budget_info.total_budget = total;
        self.budget_info.allocated_budget = allocated;
        self.budget_info.recompute();
        Ok(())
    }
}

impl Document for Client {
    type Marker = ClientMarker;
    const COLLECTION: &'static str = "clients";
    const ENTITY_TYPE: &'static str = "Client";

    fn id(&self) -> ClientId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone())]
    }
}

fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(DomainError::ValidationError(format!("invalid email: {raw}"))),
    }
}

fn non_negative_budget(total: Decimal, allocated: Decimal) -> DomainResult<()> {
    if total < Decimal::ZERO || allocated < Decimal::ZERO {
        return Err(DomainError::validation("budget figures must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn acme(total: i64) -> Client {
        Client::new(
            NewClient {
                name: "Acme Holdings".into(),
                email: "Projects@Acme.example".into(),
                total_budget: dec(total),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test_case(0, 100 => BudgetStatus::Active)]
    #[test_case(99, 100 => BudgetStatus::Active)]
    #[test_case(100, 100 => BudgetStatus::Completed)]
    #[test_case(150, 100 => BudgetStatus::Exceeded)]
    #[test_case(0, 0 => BudgetStatus::Active; "zero over zero")]
    #[test_case(1, 0 => BudgetStatus::Exceeded; "spend without budget")]
    fn test_budget_status_derivation(spent: i64, total: i64) -> BudgetStatus {
        BudgetStatus::derive(dec(spent), dec(total))
    }

    #[test]
    fn test_add_over_budget_is_exceeded() {
        let mut client = acme(100);
        client.update_budget(dec(150), BudgetOperation::Add).unwrap();
        assert_eq!(client.budget_info().spent_budget(), dec(150));
        assert_eq!(client.budget_info().budget_status(), BudgetStatus::Exceeded);
        assert_eq!(client.budget_info().remaining_budget(), dec(-50));
    }

    #[test]
    fn test_subtract_floors_at_zero_and_set_replaces() {
        let mut client = acme(100);
        client.update_budget(dec(30), BudgetOperation::Add).unwrap();
        client.update_budget(dec(80), BudgetOperation::Subtract).unwrap();
        assert_eq!(client.budget_info().spent_budget(), Decimal::ZERO);

        client.update_budget(dec(100), BudgetOperation::Set).unwrap();
        assert_eq!(client.budget_info().budget_status(), BudgetStatus::Completed);
    }

    #[test]
    fn test_email_is_normalized_and_validated() {
        let client = acme(0);
        assert_eq!(client.email(), "projects@acme.example");
        assert_eq!(client.unique_keys(), vec![("email", "projects@acme.example".to_string())]);

        let err = Client::new(
            NewClient {
                name: "Nobody".into(),
                email: "not-an-email".into(),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_signing_requires_both_parties_in_any_order() {
        for order in [
            [SignatureParty::Client, SignatureParty::Company],
            [SignatureParty::Company, SignatureParty::Client],
        ] {
            let mut client = acme(0);
            let id = client
                .add_agreement(
                    NewAgreement {
                        title: "Main works".into(),
                        ..Default::default()
                    },
                    Utc::now(),
                )
                .unwrap();

            let first = client
                .sign_agreement(id, order[0], "sig-a".into(), "Ann".into(), None, Utc::now())
                .unwrap();
            assert_eq!(first.status(), AgreementStatus::Draft);
            assert!(first.signed_date().is_none());

            let second = client
                .sign_agreement(id, order[1], "sig-b".into(), "Bob".into(), None, Utc::now())
                .unwrap();
            assert_eq!(second.status(), AgreementStatus::Signed);
            assert!(second.signed_date().is_some());
        }
    }

    #[test]
    fn test_client_signature_never_records_company_user() {
        let mut client = acme(0);
        let id = client
            .add_agreement(
                NewAgreement {
                    title: "Annex".into(),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();
        let agreement = client
            .sign_agreement(
                id,
                SignatureParty::Client,
                "sig".into(),
                "Carla".into(),
                Some(UserId::new()),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(agreement.signed_by().client.as_ref().unwrap().signed_by, None);
    }

    #[test]
    fn test_unknown_agreement() {
        let mut client = acme(0);
        let err = client
            .sign_agreement(
                AgreementId::new(),
                SignatureParty::Client,
                "sig".into(),
                "Ann".into(),
                None,
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::AgreementNotFound { .. }));
    }

    #[test]
    fn test_agreement_cannot_start_signed() {
        let err = Agreement::new(
            NewAgreement {
                title: "Shortcut".into(),
                status: Some(AgreementStatus::Signed),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap_err();
        assert!(err.is_validation_error());
    }
}
