//! Reconciliation engine - converges the server onto a [`DesiredState`]
//!
//! A run is strictly sequential and follows a fixed dependency order:
//!
//! 1. log in
//! 2. resolve templates (the base template must exist)
//! 3. resolve or create the host group
//! 4. create each host, or replace the templates of an existing one
//! 5. create the web scenario on the first declared host
//! 6. create the CPU, disk and availability triggers
//! 7. create (or skip / replace) the dashboards
//!
//! Every create is preceded by exactly one existence lookup. Failures are
//! fatal everywhere except in the trigger phase, where they are recorded in
//! the [`RunReport`] and the run moves on.

use crate::context::{Phase, ProgressCallback};
use crate::dashboard::{self, CPU_ITEM, Graph, Header, WEB_ITEM};
use crate::error::{Error, Result};
use crate::layout::Grid;
use crate::report::RunReport;
use crate::resolver::ExistenceResolver;
use crate::triggers;
use crate::types::{Change, ConflictPolicy, DesiredState, HostSpec, Outcome, Role};
use serde_json::json;
use zabbix::{
    Client, GroupRef, NewHost, NewInterface, NewTrigger, NewWebScenario, ObjectKind, TemplateRef,
    WebStep,
};

/// Login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Drives one reconciliation run.
///
/// # Example
///
/// ```
/// use reconcile::{Credentials, NoProgress, Reconciler};
/// # use reconcile::{DesiredState, HostSpec, Role, WebCheck, DashboardSettings};
/// # use zabbix::{Client, MockBackend};
/// # let mock = MockBackend::new();
/// # mock.add_template("Linux by Zabbix agent", &["system.cpu.util"]);
/// # let desired = DesiredState {
/// #     group: "Servers".into(),
/// #     base_template: "Linux by Zabbix agent".into(),
/// #     web_template: None,
/// #     hosts: vec![HostSpec::new("db1", "Database", "10.0.0.9".parse().unwrap(), Role::Generic)],
/// #     web_check: WebCheck { url: "http://10.0.0.9/".into(), ..WebCheck::default() },
/// #     dashboards: DashboardSettings::default(),
/// # };
///
/// let mut client = Client::with_backend(Box::new(mock.clone()));
/// let report = Reconciler::new(&mut client, &desired)
///     .run(&Credentials::new("Admin", "zabbix"), &mut NoProgress)?;
///
/// assert_eq!(report.hosts.created, 1);
/// # Ok::<(), reconcile::Error>(())
/// ```
pub struct Reconciler<'a> {
    client: &'a mut Client,
    desired: &'a DesiredState,
    dry_run: bool,
    grid: Grid,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a mut Client, desired: &'a DesiredState) -> Self {
        Self {
            client,
            desired,
            dry_run: false,
            grid: Grid::default(),
        }
    }

    /// Look everything up but issue no mutation.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Override the dashboard grid.
    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = grid;
        self
    }

    /// Execute the run.
    ///
    /// Returns the report on success, including when trigger failures were
    /// recovered. Any returned error means the run stopped early; objects
    /// created before that point remain on the server.
    pub fn run<P: ProgressCallback>(self, credentials: &Credentials, progress: &mut P) -> Result<RunReport> {
        self.desired.validate()?;

        progress.on_phase(Phase::Authenticate);
        self.client
            .login(&credentials.username, &credentials.password)
            .map_err(Error::Authentication)?;

        let client: &Client = self.client;
        let mut run = Run {
            client,
            resolver: ExistenceResolver::new(client),
            desired: self.desired,
            dry_run: self.dry_run,
            grid: self.grid,
            report: RunReport::new(self.dry_run),
            progress,
        };

        run.execute()?;
        Ok(run.report)
    }
}

/// Template ids resolved in step 2.
struct Templates {
    base: String,
    web: Option<String>,
}

impl Templates {
    /// Base template always; the web template only for web hosts.
    fn for_role(&self, role: Role) -> Vec<String> {
        let mut ids = vec![self.base.clone()];
        if role == Role::Web
            && let Some(web) = &self.web
        {
            ids.push(web.clone());
        }
        ids
    }
}

/// State of a run after login.
struct Run<'c, 'p, P: ProgressCallback> {
    client: &'c Client,
    resolver: ExistenceResolver<'c>,
    desired: &'c DesiredState,
    dry_run: bool,
    grid: Grid,
    report: RunReport,
    progress: &'p mut P,
}

impl<P: ProgressCallback> Run<'_, '_, P> {
    fn execute(&mut self) -> Result<()> {
        self.progress.on_phase(Phase::Templates);
        let templates = self.templates()?;

        self.progress.on_phase(Phase::HostGroup);
        let groupid = self.host_group()?;

        self.progress.on_phase(Phase::Hosts);
        let desired = self.desired;
        let mut hostids = Vec::with_capacity(desired.hosts.len());
        for spec in &desired.hosts {
            hostids.push(self.host(spec, &templates, groupid.as_deref())?);
        }

        self.progress.on_phase(Phase::WebScenario);
        self.web_scenario(hostids.first().cloned().flatten())?;

        self.progress.on_phase(Phase::Triggers);
        self.triggers(&hostids);

        self.progress.on_phase(Phase::Dashboards);
        self.dashboards(groupid.as_deref(), &hostids)?;

        Ok(())
    }

    fn record(&mut self, kind: ObjectKind, key: &str, outcome: Outcome) {
        self.progress.on_outcome(kind, key, &outcome);
        self.report.record(kind, key, &outcome);
    }

    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.progress.on_warning(&message);
        self.report.warn(message);
    }

    fn find(&self, kind: ObjectKind, key: &str, scope: Option<&str>) -> Result<Option<String>> {
        self.resolver
            .find(kind, key, scope)
            .map_err(|e| Error::remote("look up", kind, key, e))
    }

    fn planned(change: Change) -> Outcome {
        Outcome::Planned { change }
    }

    // =========================================================================
    // Steps
    // =========================================================================

    fn templates(&mut self) -> Result<Templates> {
        let desired = self.desired;
        let base_name = &desired.base_template;
        let base = self
            .find(ObjectKind::Template, base_name, None)?
            .ok_or_else(|| Error::PreconditionMissing {
                kind: ObjectKind::Template,
                key: base_name.clone(),
            })?;

        let web = match &desired.web_template {
            Some(name) => {
                let found = self.find(ObjectKind::Template, name, None)?;
                if found.is_none() {
                    self.warn(format!(
                        "Template '{name}' not found; web hosts get '{base_name}' only"
                    ));
                }
                found
            }
            None => None,
        };

        Ok(Templates { base, web })
    }

    fn host_group(&mut self) -> Result<Option<String>> {
        let desired = self.desired;
        let name = &desired.group;
        if let Some(id) = self.find(ObjectKind::HostGroup, name, None)? {
            self.record(ObjectKind::HostGroup, name, Outcome::exists());
            return Ok(Some(id));
        }

        if self.dry_run {
            self.record(ObjectKind::HostGroup, name, Self::planned(Change::Create));
            return Ok(None);
        }

        let id = self
            .client
            .create(ObjectKind::HostGroup, &json!({ "name": name }))
            .map_err(|e| Error::remote("create", ObjectKind::HostGroup, name, e))?;
        log::info!("Created host group '{name}' ({id})");
        self.record(ObjectKind::HostGroup, name, Outcome::Created);
        Ok(Some(id))
    }

    fn host(&mut self, spec: &HostSpec, templates: &Templates, groupid: Option<&str>) -> Result<Option<String>> {
        let key = spec.hostname.as_str();
        let existing = self.find(ObjectKind::Host, key, None)?;
        let template_ids = templates.for_role(spec.role);

        match (existing, self.dry_run) {
            (Some(id), true) => {
                self.record(ObjectKind::Host, key, Self::planned(Change::Update));
                Ok(Some(id))
            }
            (Some(id), false) => {
                self.client
                    .update_host_templates(&id, &template_ids)
                    .map_err(|e| Error::remote("update", ObjectKind::Host, key, e))?;
                log::info!("Updated templates of host '{key}' ({id})");
                self.record(ObjectKind::Host, key, Outcome::Updated);
                Ok(Some(id))
            }
            (None, true) => {
                self.record(ObjectKind::Host, key, Self::planned(Change::Create));
                Ok(None)
            }
            (None, false) => {
                let groupid = groupid.ok_or_else(|| Error::PreconditionMissing {
                    kind: ObjectKind::HostGroup,
                    key: self.desired.group.clone(),
                })?;
                let host = NewHost {
                    host: spec.hostname.clone(),
                    name: spec.name.clone(),
                    interfaces: vec![NewInterface::agent(spec.address.to_string())],
                    groups: vec![GroupRef {
                        groupid: groupid.to_string(),
                    }],
                    templates: template_ids
                        .into_iter()
                        .map(|templateid| TemplateRef { templateid })
                        .collect(),
                };
                let id = self
                    .client
                    .create(ObjectKind::Host, &host)
                    .map_err(|e| Error::remote("create", ObjectKind::Host, key, e))?;
                log::info!("Created host '{key}' ({id}) at {}", spec.address);
                self.record(ObjectKind::Host, key, Outcome::Created);
                Ok(Some(id))
            }
        }
    }

    fn web_scenario(&mut self, hostid: Option<String>) -> Result<()> {
        let desired = self.desired;
        let check = &desired.web_check;
        let key = check.name.as_str();

        // Only a dry run can reach this without the host existing.
        let Some(hostid) = hostid else {
            self.record(ObjectKind::WebScenario, key, Self::planned(Change::Create));
            return Ok(());
        };

        if self.find(ObjectKind::WebScenario, key, Some(&hostid))?.is_some() {
            self.record(ObjectKind::WebScenario, key, Outcome::exists());
            return Ok(());
        }

        if self.dry_run {
            self.record(ObjectKind::WebScenario, key, Self::planned(Change::Create));
            return Ok(());
        }

        let scenario = NewWebScenario {
            name: check.name.clone(),
            hostid: hostid.clone(),
            delay: check.interval.clone(),
            steps: vec![WebStep {
                no: 1,
                name: "Homepage check".to_string(),
                url: check.url.clone(),
                status_codes: check.expected_status.to_string(),
            }],
        };
        let id = self
            .client
            .create(ObjectKind::WebScenario, &scenario)
            .map_err(|e| Error::remote("create", ObjectKind::WebScenario, key, e))?;
        log::info!("Created web scenario '{key}' ({id}) on host {hostid}");
        self.record(ObjectKind::WebScenario, key, Outcome::Created);
        Ok(())
    }

    /// Every failure in this phase is recorded and the loop continues.
    ///
    /// `hostids` are the ids from the host phase, in declaration order.
    fn triggers(&mut self, hostids: &[Option<String>]) {
        let desired = self.desired;

        for (spec, hostid) in desired.hosts.iter().zip(hostids) {
            let wanted = triggers::host_triggers(&spec.hostname);
            self.host_triggers(&spec.hostname, hostid.as_deref(), wanted);
        }

        if let Some(spec) = desired.web_check_host() {
            let trigger = triggers::availability_trigger(&spec.hostname, &desired.web_check);
            let hostid = hostids.first().and_then(Option::as_deref);
            self.host_triggers(&spec.hostname, hostid, vec![trigger]);
        }
    }

    fn host_triggers(&mut self, hostname: &str, hostid: Option<&str>, wanted: Vec<NewTrigger>) {
        let Some(hostid) = hostid else {
            if self.dry_run {
                for trigger in &wanted {
                    self.record(ObjectKind::Trigger, &trigger.description, Self::planned(Change::Create));
                }
            } else {
                self.warn(format!("Host '{hostname}' not found; skipping its triggers"));
            }
            return;
        };

        for trigger in wanted {
            let outcome = self.trigger(hostid, &trigger);
            self.record(ObjectKind::Trigger, &trigger.description, outcome);
        }
    }

    fn trigger(&self, hostid: &str, trigger: &NewTrigger) -> Outcome {
        let key = trigger.description.as_str();
        match self.resolver.find(ObjectKind::Trigger, key, Some(hostid)) {
            Ok(Some(_)) => return Outcome::exists(),
            Ok(None) if self.dry_run => return Self::planned(Change::Create),
            Ok(None) => {}
            Err(e) => {
                log::warn!("Could not look up trigger '{key}': {e}");
                return Outcome::Failed { error: e.to_string() };
            }
        }

        match self.client.create(ObjectKind::Trigger, trigger) {
            Ok(id) => {
                log::info!("Created trigger '{key}' ({id})");
                Outcome::Created
            }
            Err(e) => {
                log::warn!("Could not create trigger '{key}' on host {hostid}: {e}");
                Outcome::Failed { error: e.to_string() }
            }
        }
    }

    fn dashboards(&mut self, groupid: Option<&str>, hostids: &[Option<String>]) -> Result<()> {
        let desired = self.desired;
        let settings = &desired.dashboards;

        let hosts: Vec<(&HostSpec, &str)> = desired
            .hosts
            .iter()
            .zip(hostids)
            .filter_map(|(spec, id)| id.as_deref().map(|id| (spec, id)))
            .collect();

        let overview_hosts: Vec<(&HostSpec, &str)> = hosts
            .iter()
            .take(settings.overview_graph_limit)
            .copied()
            .collect();
        self.dashboard(&settings.overview, Header::HostStatus, groupid, &overview_hosts, CPU_ITEM, "CPU")?;

        if desired.has_web_hosts() {
            let web_hosts: Vec<(&HostSpec, &str)> =
                hosts.iter().filter(|(spec, _)| spec.is_web()).copied().collect();
            self.dashboard(&settings.web, Header::Problems, groupid, &web_hosts, WEB_ITEM, "Nginx")?;
        }

        Ok(())
    }

    fn dashboard(
        &mut self,
        name: &str,
        header: Header,
        groupid: Option<&str>,
        hosts: &[(&HostSpec, &str)],
        item_key: &str,
        title: &str,
    ) -> Result<()> {
        let existing = self.find(ObjectKind::Dashboard, name, None)?;
        let policy = self.desired.dashboards.on_conflict;

        if existing.is_some() && policy == ConflictPolicy::Skip {
            self.record(ObjectKind::Dashboard, name, Outcome::exists());
            return Ok(());
        }

        if self.dry_run {
            let change = if existing.is_some() { Change::Replace } else { Change::Create };
            self.record(ObjectKind::Dashboard, name, Self::planned(change));
            return Ok(());
        }

        let groupid = groupid.ok_or_else(|| Error::PreconditionMissing {
            kind: ObjectKind::HostGroup,
            key: self.desired.group.clone(),
        })?;

        let mut graphs = Vec::with_capacity(hosts.len());
        for (spec, hostid) in hosts {
            match self.find(ObjectKind::Item, item_key, Some(*hostid))? {
                Some(itemid) => graphs.push(Graph {
                    title: format!("{title} - {}", spec.name),
                    itemid,
                }),
                None => self.warn(format!(
                    "Item '{item_key}' not found on host '{}'; dropping its graph from '{name}'",
                    spec.hostname
                )),
            }
        }

        if let Some(id) = &existing {
            self.client
                .delete(ObjectKind::Dashboard, std::slice::from_ref(id))
                .map_err(|e| Error::remote("delete", ObjectKind::Dashboard, name, e))?;
            log::info!("Deleted dashboard '{name}' ({id})");
        }

        let definition = dashboard::build(name, header, groupid, &graphs, &self.grid);
        let id = self
            .client
            .create(ObjectKind::Dashboard, &definition)
            .map_err(|e| Error::remote("create", ObjectKind::Dashboard, name, e))?;
        log::info!("Created dashboard '{name}' ({id}) with {} graphs", graphs.len());

        let outcome = if existing.is_some() { Outcome::Replaced } else { Outcome::Created };
        self.record(ObjectKind::Dashboard, name, outcome);
        Ok(())
    }
}
