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

// Env values used to load netsuite credentials.
pub const NETSUITE_ACCOUNT_ID: &str = "NETSUITE_ACCOUNT_ID";
pub const NETSUITE_CONSUMER_KEY: &str = "NETSUITE_CONSUMER_KEY";
pub const NETSUITE_CONSUMER_SECRET: &str = "NETSUITE_CONSUMER_SECRET";
pub const NETSUITE_TOKEN_ID: &str = "NETSUITE_TOKEN_ID";
pub const NETSUITE_TOKEN_SECRET: &str = "NETSUITE_TOKEN_SECRET";
pub const NETSUITE_CREDENTIALS_FILE: &str = "NETSUITE_CREDENTIALS_FILE";

// OAuth 1.0a protocol parameters.
pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub const OAUTH_TOKEN: &str = "oauth_token";
pub const OAUTH_NONCE: &str = "oauth_nonce";
pub const OAUTH_TIMESTAMP: &str = "oauth_timestamp";
pub const OAUTH_SIGNATURE_METHOD: &str = "oauth_signature_method";
pub const OAUTH_VERSION: &str = "oauth_version";
pub const OAUTH_SIGNATURE: &str = "oauth_signature";

pub const OAUTH_PARAM_PREFIX: &str = "oauth_";
pub const HMAC_SHA256: &str = "HMAC-SHA256";
pub const OAUTH_VERSION_1_0: &str = "1.0";

/// Random bytes per nonce, hex encoded into 32 characters.
pub const NONCE_BYTES: usize = 16;
