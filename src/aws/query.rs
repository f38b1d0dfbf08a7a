//! Resource query execution
//!
//! Maps each action kind to its single read-only AWS call and shapes the
//! first matching record into a field-keyed JSON payload. One call per
//! execution, no retries; a remote failure comes back as
//! [`QueryOutcome::Errored`] rather than pretending nothing matched.

use super::session::AccountSession;
use crate::dispatch::QueryOutcome;
use anyhow::{Context, Result};
use aws_sdk_ec2::types::{Filter, Image, Instance, Tag};
use aws_sdk_elasticbeanstalk::types::{
    ApplicationDescription, EnvironmentDescription, EnvironmentResourceDescription,
};
use clap::ValueEnum;
use serde_json::{json, Value};

/// The kind of resource lookup to run.
///
/// Validated by clap before anything is spawned, so an unknown action can
/// never surface inside a running query task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// EC2 instance by instance id
    Instance,
    /// EC2 instance by private IP address
    Ip,
    /// EC2 instance by public IP address
    PublicIp,
    /// Machine image by image id
    Ami,
    /// Elastic Beanstalk application by name
    Eb,
    /// Elastic Beanstalk environment resource set by environment name
    EbResources,
    /// Elastic Beanstalk environment by name
    EbEnv,
}

/// Run one lookup against one account session.
pub async fn execute(session: &AccountSession, action: Action, id: &str) -> QueryOutcome {
    let result = match action {
        Action::Instance => query_instance(session, "instance-id", id).await,
        Action::Ip => query_instance(session, "private-ip-address", id).await,
        Action::PublicIp => query_instance(session, "ip-address", id).await,
        Action::Ami => query_image(session, id).await,
        Action::Eb => query_application(session, id).await,
        Action::EbResources => query_environment_resources(session, id).await,
        Action::EbEnv => query_environment(session, id).await,
    };

    match result {
        Ok(Some(payload)) => QueryOutcome::Found(payload),
        Ok(None) => QueryOutcome::NotFound,
        Err(err) => QueryOutcome::Errored(err),
    }
}

/// DescribeInstances with one equality filter.
async fn query_instance(
    session: &AccountSession,
    filter_name: &str,
    value: &str,
) -> Result<Option<Value>> {
    tracing::debug!(
        "DescribeInstances in {}: {} = {}",
        session.account,
        filter_name,
        value
    );
    let resp = session
        .ec2()
        .describe_instances()
        .filters(Filter::builder().name(filter_name).values(value).build())
        .send()
        .await
        .context("DescribeInstances failed")?;

    let instance = resp
        .reservations()
        .iter()
        .flat_map(|r| r.instances())
        .next();
    Ok(instance.map(instance_to_json))
}

/// DescribeImages by direct image id.
async fn query_image(session: &AccountSession, image_id: &str) -> Result<Option<Value>> {
    tracing::debug!("DescribeImages in {}: {}", session.account, image_id);
    let resp = session
        .ec2()
        .describe_images()
        .image_ids(image_id)
        .send()
        .await
        .context("DescribeImages failed")?;

    let image = resp.images().first();
    if let Some(image) = image {
        tracing::debug!(
            "Found image in account {} (owner {:?}), name {:?}",
            session.account,
            image.owner_id(),
            image.name()
        );
    }
    Ok(image.map(image_to_json))
}

/// DescribeApplications by application name.
async fn query_application(session: &AccountSession, name: &str) -> Result<Option<Value>> {
    tracing::debug!("DescribeApplications in {}: {}", session.account, name);
    let resp = session
        .beanstalk()
        .describe_applications()
        .application_names(name)
        .send()
        .await
        .context("DescribeApplications failed")?;

    Ok(resp.applications().first().map(application_to_json))
}

/// DescribeEnvironments by environment name.
async fn query_environment(session: &AccountSession, name: &str) -> Result<Option<Value>> {
    tracing::debug!("DescribeEnvironments in {}: {}", session.account, name);
    let resp = session
        .beanstalk()
        .describe_environments()
        .environment_names(name)
        .send()
        .await
        .context("DescribeEnvironments failed")?;

    Ok(resp.environments().first().map(environment_to_json))
}

/// DescribeEnvironmentResources by environment name.
async fn query_environment_resources(
    session: &AccountSession,
    name: &str,
) -> Result<Option<Value>> {
    tracing::debug!(
        "DescribeEnvironmentResources in {}: {}",
        session.account,
        name
    );
    let resp = session
        .beanstalk()
        .describe_environment_resources()
        .environment_name(name)
        .send()
        .await
        .context("DescribeEnvironmentResources failed")?;

    Ok(resp.environment_resources().map(resources_to_json))
}

fn tags_to_json(tags: &[Tag]) -> Value {
    Value::Object(
        tags.iter()
            .filter_map(|t| {
                let key = t.key()?;
                Some((key.to_string(), Value::from(t.value().unwrap_or_default())))
            })
            .collect(),
    )
}

pub fn instance_to_json(instance: &Instance) -> Value {
    json!({
        "instance_id": instance.instance_id(),
        "state": instance.state().and_then(|s| s.name()).map(|n| n.as_str()),
        "instance_type": instance.instance_type().map(|t| t.as_str()),
        "image_id": instance.image_id(),
        "private_ip_address": instance.private_ip_address(),
        "public_ip_address": instance.public_ip_address(),
        "availability_zone": instance.placement().and_then(|p| p.availability_zone()),
        "vpc_id": instance.vpc_id(),
        "subnet_id": instance.subnet_id(),
        "tags": tags_to_json(instance.tags()),
    })
}

pub fn image_to_json(image: &Image) -> Value {
    json!({
        "image_id": image.image_id(),
        "name": image.name(),
        "owner_id": image.owner_id(),
        "state": image.state().map(|s| s.as_str()),
        "description": image.description(),
        "creation_date": image.creation_date(),
        "tags": tags_to_json(image.tags()),
    })
}

pub fn application_to_json(app: &ApplicationDescription) -> Value {
    json!({
        "application_name": app.application_name(),
        "application_arn": app.application_arn(),
        "description": app.description(),
        "versions": app.versions(),
    })
}

pub fn environment_to_json(env: &EnvironmentDescription) -> Value {
    json!({
        "environment_name": env.environment_name(),
        "environment_id": env.environment_id(),
        "application_name": env.application_name(),
        "version_label": env.version_label(),
        "solution_stack_name": env.solution_stack_name(),
        "status": env.status().map(|s| s.as_str()),
        "health": env.health().map(|h| h.as_str()),
        "cname": env.cname(),
        "endpoint_url": env.endpoint_url(),
    })
}

pub fn resources_to_json(resources: &EnvironmentResourceDescription) -> Value {
    json!({
        "environment_name": resources.environment_name(),
        "instances": resources
            .instances()
            .iter()
            .filter_map(|i| i.id())
            .collect::<Vec<_>>(),
        "auto_scaling_groups": resources
            .auto_scaling_groups()
            .iter()
            .filter_map(|g| g.name())
            .collect::<Vec<_>>(),
        "load_balancers": resources
            .load_balancers()
            .iter()
            .filter_map(|l| l.name())
            .collect::<Vec<_>>(),
        "launch_configurations": resources
            .launch_configurations()
            .iter()
            .filter_map(|l| l.name())
            .collect::<Vec<_>>(),
        "queues": resources
            .queues()
            .iter()
            .filter_map(|q| q.name())
            .collect::<Vec<_>>(),
        "triggers": resources
            .triggers()
            .iter()
            .filter_map(|t| t.name())
            .collect::<Vec<_>>(),
    })
}
