//! Blocking driver: the issuing computation calls `input`/`input_group` and
//! gets a value back once a submission passes validation.

use anyhow::Result;

use crate::error::InputError;
use crate::input::group::InputGroup;
use crate::input::single::SingleInput;
use crate::input::FieldInput;
use crate::model::{FieldValue, FormData};
use crate::protocol::{Emission, PendingRequest, Resolve, Step, Submission};

/// The renderer/transport collaborator.
pub trait Transport {
    fn show(&mut self, emission: &Emission) -> Result<()>;
    fn receive(&mut self) -> Result<Submission>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn show(&mut self, emission: &Emission) -> Result<()> {
        (**self).show(emission)
    }

    fn receive(&mut self) -> Result<Submission> {
        (**self).receive()
    }
}

pub struct Session<T> {
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Show the form, then keep re-showing it until a submission resolves.
    /// Stale submissions end the call; they are never skipped.
    pub fn run<R: Resolve>(&mut self, resolver: R) -> Result<R::Output, InputError> {
        let mut request = PendingRequest::new(resolver);
        let emission = request.present()?;
        self.transport.show(&emission)?;
        loop {
            let submission = self.transport.receive()?;
            match request.deliver(submission)? {
                Step::Resolved(out) => return Ok(out),
                Step::Display(next) => self.transport.show(&next)?,
            }
        }
    }

    pub fn input(&mut self, field: FieldInput) -> Result<FieldValue, InputError> {
        let single = SingleInput::new(field)?;
        self.run(single)
    }

    pub fn input_group(&mut self, group: InputGroup) -> Result<FormData, InputError> {
        self.run(group)
    }
}
