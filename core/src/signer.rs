// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::{Context, Error, ProvideCredential, Result, SignRequest, SigningCredential};
use log::debug;
use std::sync::Arc;

/// Signer is the main struct used to sign the request.
///
/// The credential is resolved once when the signer is built and never
/// changes afterwards, so a `Signer` can be cloned into every request
/// handler and used concurrently without locking.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    builder: Arc<dyn SignRequest<Credential = K>>,
    credential: Arc<K>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer from an already loaded credential.
    pub fn new(ctx: Context, credential: K, builder: impl SignRequest<Credential = K>) -> Self {
        Self {
            ctx,
            builder: Arc::new(builder),
            credential: Arc::new(credential),
        }
    }

    /// Load the credential through `loader` and create a new signer.
    ///
    /// Fails with a fatal error if no provider yields a credential or the
    /// credential is incomplete.
    pub async fn load(
        ctx: Context,
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Result<Self> {
        let credential = loader
            .provide_credential(&ctx)
            .await?
            .ok_or_else(|| Error::config_invalid("no credential found by any provider"))?;
        if !credential.is_valid() {
            return Err(Error::credential_invalid(
                "loaded credential is incomplete",
            ));
        }
        debug!("signer loaded credential: {credential:?}");

        Ok(Self::new(ctx, credential, builder))
    }

    /// The context this signer was built with.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The credential used for every request.
    pub fn credential(&self) -> &K {
        &self.credential
    }

    /// Signing request.
    pub async fn sign(&self, req: &mut http::request::Parts) -> Result<()> {
        self.builder
            .sign_request(&self.ctx, req, &self.credential)
            .await
    }
}
