//! IAM policy documents
//!
//! Statements may name resources that only exist once another declaration is
//! applied (a looked-up secret ARN, a queue ARN), so a document renders to an
//! [`Input`] rather than a plain JSON value.

use infrakit_cloud::{Input, Properties};

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::Allow => "Allow",
            Effect::Deny => "Deny",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolicyStatement {
    pub effect: Effect,
    pub actions: Vec<String>,
    pub resources: Vec<Input>,
    /// `Principal` object, trust policies only
    pub principal: Option<Properties>,
}

impl PolicyStatement {
    pub fn allow<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: Vec::new(),
            principal: None,
        }
    }

    pub fn on(mut self, resource: impl Into<Input>) -> Self {
        self.resources.push(resource.into());
        self
    }

    /// `Resource: "*"`
    pub fn on_any(self) -> Self {
        self.on("*")
    }

    pub fn principal(mut self, kind: &str, value: impl Into<Input>) -> Self {
        let principal = self.principal.take().unwrap_or_default();
        self.principal = Some(principal.with(kind, value));
        self
    }

    fn to_input(&self) -> Input {
        let action: Input = match self.actions.as_slice() {
            [single] => single.as_str().into(),
            many => many.to_vec().into(),
        };

        let mut statement = Properties::new()
            .with("Effect", self.effect.as_str())
            .with("Action", action);
        match self.resources.as_slice() {
            [] => {}
            [single] => statement.set("Resource", single.clone()),
            many => statement.set("Resource", Input::List(many.to_vec())),
        }
        if let Some(principal) = &self.principal {
            statement.set("Principal", principal.clone());
        }
        statement.into()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PolicyDocument {
    statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statement(mut self, statement: PolicyStatement) -> Self {
        self.statements.push(statement);
        self
    }

    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    /// Trust policy letting an AWS service (`lambda.amazonaws.com`) assume a role
    pub fn assume_role_by_service(service: &str) -> Self {
        Self::new().statement(
            PolicyStatement::allow(["sts:AssumeRole"]).principal("Service", service),
        )
    }

    /// Trust policy letting whole accounts assume a role
    pub fn assume_role_by_accounts<I, S>(account_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let principals: Vec<String> = account_ids
            .into_iter()
            .map(|id| crate::arn::account_root_principal(id.as_ref()))
            .collect();
        Self::new().statement(PolicyStatement::allow(["sts:AssumeRole"]).principal("AWS", principals))
    }

    pub fn to_input(&self) -> Input {
        let statements: Vec<Input> = self.statements.iter().map(PolicyStatement::to_input).collect();
        Properties::new()
            .with("Version", POLICY_VERSION)
            .with("Statement", statements)
            .into()
    }
}

impl From<PolicyDocument> for Input {
    fn from(document: PolicyDocument) -> Self {
        document.to_input()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_input() {
        let document = PolicyDocument::new().statement(
            PolicyStatement::allow(["sqs:ReceiveMessage", "sqs:DeleteMessage"]).on_any(),
        );

        let expected: Input = Properties::new()
            .with("Version", "2012-10-17")
            .with(
                "Statement",
                vec![Input::from(
                    Properties::new()
                        .with("Effect", "Allow")
                        .with("Action", vec!["sqs:ReceiveMessage", "sqs:DeleteMessage"])
                        .with("Resource", "*"),
                )],
            )
            .into();
        assert_eq!(document.to_input(), expected);
    }

    #[test]
    fn test_single_action_is_a_string() {
        let document = PolicyDocument::assume_role_by_service("lambda.amazonaws.com");
        let Input::Object(fields) = document.to_input() else {
            panic!("policy is an object");
        };
        let Some(Input::List(statements)) = fields.get("Statement") else {
            panic!("statements are a list");
        };
        let Input::Object(statement) = &statements[0] else {
            panic!("statement is an object");
        };
        assert_eq!(statement.get("Action"), Some(&Input::from("sts:AssumeRole")));
        assert!(!statement.contains_key("Resource"));
    }

    #[test]
    fn test_trust_policy_by_accounts() {
        let document = PolicyDocument::assume_role_by_accounts(["111", "222"]);
        let statement = &document.statements()[0];

        assert_eq!(statement.actions, vec!["sts:AssumeRole".to_string()]);
        let principal = statement.principal.as_ref().unwrap();
        assert_eq!(
            principal.get("AWS"),
            Some(&Input::from(vec!["arn:aws:iam::111:root", "arn:aws:iam::222:root"]))
        );
        assert!(statement.resources.is_empty());
    }
}
