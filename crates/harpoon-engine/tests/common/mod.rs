//! Recording container runtime for applier tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;

use harpoon_engine::{ContainerId, ContainerRuntime, ContainerSpec, Error, OpContext, Result};

/// One call made against the fake runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ImageExists(String),
    Pull(String),
    Create(String),
    Start(String),
    Wait(String),
    Remove(String),
}

/// In-memory runtime that records calls and can be told to fail.
#[derive(Default)]
pub struct FakeRuntime {
    pub calls: RefCell<Vec<Call>>,
    pub specs: RefCell<Vec<ContainerSpec>>,
    pub live: RefCell<HashSet<String>>,
    pub image_present: bool,
    pub fail_pull: bool,
    pub fail_start: bool,
    pub fail_remove: bool,
    pub exit_code: i64,
    /// Cancel this context when start is called
    pub cancel_on_start: Option<OpContext>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            image_present: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn created(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Create(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl ContainerRuntime for FakeRuntime {
    fn image_exists(&self, ctx: &OpContext, image: &str) -> Result<bool> {
        ctx.check("inspect image")?;
        self.record(Call::ImageExists(image.to_string()));
        Ok(self.image_present)
    }

    fn pull_image(&self, ctx: &OpContext, image: &str) -> Result<()> {
        ctx.check("pull image")?;
        self.record(Call::Pull(image.to_string()));
        if self.fail_pull {
            return Err(Error::runtime("pull image", "manifest unknown"));
        }
        Ok(())
    }

    fn create_container(&self, ctx: &OpContext, spec: &ContainerSpec) -> Result<ContainerId> {
        ctx.check("create container")?;
        self.record(Call::Create(spec.name().to_string()));
        if !self.live.borrow_mut().insert(spec.name().to_string()) {
            return Err(Error::runtime(
                "create container",
                format!("the container name \"{}\" is already in use", spec.name()),
            ));
        }
        self.specs.borrow_mut().push(spec.clone());
        Ok(ContainerId(spec.name().to_string()))
    }

    fn start_container(&self, ctx: &OpContext, id: &ContainerId) -> Result<()> {
        if let Some(to_cancel) = &self.cancel_on_start {
            to_cancel.cancel();
        }
        ctx.check("start container")?;
        self.record(Call::Start(id.0.clone()));
        if self.fail_start {
            return Err(Error::runtime("start container", "OCI runtime error"));
        }
        Ok(())
    }

    fn wait_container(&self, ctx: &OpContext, id: &ContainerId) -> Result<i64> {
        ctx.check("wait for container")?;
        self.record(Call::Wait(id.0.clone()));
        Ok(self.exit_code)
    }

    fn remove_container(&self, ctx: &OpContext, id: &ContainerId) -> Result<()> {
        ctx.check("remove container")?;
        self.record(Call::Remove(id.0.clone()));
        if self.fail_remove {
            return Err(Error::runtime("remove container", "device busy"));
        }
        self.live.borrow_mut().remove(&id.0);
        Ok(())
    }
}
