// Command execution for the alchemiscale-fah CLI

use std::io::Write;

use alchemiscale_fah_client::{AsWorkServerData, FahAdaptiveSamplingClient, ProjectData, keys};
use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::{
    AsCommand, CloneCommand, Cli, Command, GenCommand, KeyCommand, ProjectCommand, ProjectSpec,
    RunCommand, SettingsCommand,
};
use crate::settings::{FahAsynchronousComputeServiceSettings, SettingsOverrides};

/// Run the parsed command, writing results to stdout
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        config,
        overrides,
        command,
    } = cli;
    let load_settings = || {
        FahAsynchronousComputeServiceSettings::load(
            config.as_deref(),
            &SettingsOverrides::from(&overrides),
        )
        .context("Failed to load settings")
    };

    match command {
        Command::Key(cmd) => run_key(cmd),
        Command::Settings(SettingsCommand::Show) => print_json(&load_settings()?),
        Command::As(cmd) => run_as(&connect(&load_settings()?)?, cmd).await,
        Command::Project(cmd) => run_project(&connect(&load_settings()?)?, cmd).await,
        Command::Run(cmd) => run_run(&connect(&load_settings()?)?, cmd).await,
        Command::Clones(cmd) => run_clone(&connect(&load_settings()?)?, cmd).await,
        Command::Gen(cmd) => run_gen(&connect(&load_settings()?)?, cmd).await,
    }
}

fn connect(
    settings: &FahAsynchronousComputeServiceSettings,
) -> anyhow::Result<FahAdaptiveSamplingClient> {
    FahAdaptiveSamplingClient::new(settings.to_client_config()).with_context(|| {
        format!(
            "Failed to create FAH client with certificate {} and key {}",
            settings.fah_certificate_file.display(),
            settings.fah_key_file.display()
        )
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn run_key(cmd: KeyCommand) -> anyhow::Result<()> {
    match cmd {
        KeyCommand::Generate { out, algorithm } => {
            let key = keys::create_key_with(algorithm)?;
            keys::write_key(&key, &out)
                .with_context(|| format!("Failed to write key to {}", out.display()))?;
            print_json(&json!({ "key_file": out }))
        }
        KeyCommand::Csr {
            private_key,
            common_name,
            out,
        } => {
            let key = keys::read_key(&private_key)
                .with_context(|| format!("Failed to read key from {}", private_key.display()))?;
            keys::generate_csr(&key, &common_name, &out)?;
            print_json(&json!({ "csr_file": out, "common_name": common_name }))
        }
    }
}

async fn run_as(client: &FahAdaptiveSamplingClient, cmd: AsCommand) -> anyhow::Result<()> {
    match cmd {
        AsCommand::GetWs => print_json(&client.as_get_ws().await?),
        AsCommand::SetWs {
            max_assign_rate,
            weight,
            constraints,
        } => {
            let data = AsWorkServerData {
                max_assign_rate,
                weight,
                constraints,
            };
            client.as_set_ws(&data).await?;
            print_json(&data)
        }
        AsCommand::GetProject { project } => print_json(&client.as_get_project(project).await?),
        AsCommand::SetProject {
            project,
            weight,
            constraints,
        } => {
            client.as_set_project(project, weight, &constraints).await?;
            print_json(&client.as_get_project(project).await?)
        }
        AsCommand::ResetProject { project } => {
            client.as_reset_project(project).await?;
            info!(project, "Reset project on assignment server");
            Ok(())
        }
    }
}

impl From<ProjectSpec> for ProjectData {
    fn from(spec: ProjectSpec) -> Self {
        Self {
            core_id: spec.core_id,
            contact: spec.contact,
            runs: spec.runs,
            clones: spec.clones,
            gens: spec.gens,
            atoms: spec.atoms,
            credit: spec.credit,
            timeout: spec.timeout,
            deadline: spec.deadline,
            compression: spec.compression,
        }
    }
}

async fn run_project(client: &FahAdaptiveSamplingClient, cmd: ProjectCommand) -> anyhow::Result<()> {
    match cmd {
        ProjectCommand::List => print_json(&client.list_projects().await?),
        ProjectCommand::Get { project } => print_json(&client.get_project(project).await?),
        ProjectCommand::Create { project, spec } => {
            let data = ProjectData::from(spec);
            client.create_project(project, &data).await?;
            print_json(&client.get_project(project).await?)
        }
        ProjectCommand::Delete { project } => {
            client.delete_project(project).await?;
            info!(project, "Deleted project");
            Ok(())
        }
        ProjectCommand::Files { project } => print_json(&client.list_project_files(project).await?),
        ProjectCommand::Upload { project, src, dest } => {
            client
                .create_project_file(project, &src, &dest)
                .await
                .with_context(|| format!("Failed to upload {}", src.display()))?;
            info!(project, dest = %dest, "Uploaded project file");
            Ok(())
        }
        ProjectCommand::Download { project, src, dest } => {
            let size = client.get_project_file(project, &src, &dest).await?;
            print_json(&json!({ "path": dest, "size": size }))
        }
        ProjectCommand::Jobs { project, since } => {
            print_json(&client.get_project_jobs(project, since).await?)
        }
    }
}

async fn run_run(client: &FahAdaptiveSamplingClient, cmd: RunCommand) -> anyhow::Result<()> {
    match cmd {
        RunCommand::Create {
            project,
            core,
            system,
            state,
            integrator,
        } => {
            let run = client
                .create_run(project, &core, &system, &state, &integrator)
                .await?;
            print_json(&json!({ "project": project, "run": run }))
        }
    }
}

async fn run_clone(client: &FahAdaptiveSamplingClient, cmd: CloneCommand) -> anyhow::Result<()> {
    match cmd {
        CloneCommand::Create(target) => {
            client
                .create_clone(target.project, target.run, target.clone)
                .await?;
            print_json(&client.get_clone(target.project, target.run, target.clone).await?)
        }
        CloneCommand::Get(target) => {
            print_json(&client.get_clone(target.project, target.run, target.clone).await?)
        }
        CloneCommand::Files(target) => print_json(
            &client
                .list_clone_files(target.project, target.run, target.clone)
                .await?,
        ),
        CloneCommand::Action { target, action } => {
            client
                .clone_action(target.project, target.run, target.clone, action)
                .await?;
            print_json(&client.get_clone(target.project, target.run, target.clone).await?)
        }
    }
}

async fn run_gen(client: &FahAdaptiveSamplingClient, cmd: GenCommand) -> anyhow::Result<()> {
    match cmd {
        GenCommand::Files { target, generation } => print_json(
            &client
                .list_gen_files(target.project, target.run, target.clone, generation)
                .await?,
        ),
    }
}
