use serde::{Deserialize, Serialize};
use tessera_core::{Address, OutputId, TransactionId};
use tessera_crypto::{KeyPair, PublicKey, Signature};

use crate::client::LedgerClient;
use crate::error::LedgerError;
use crate::output::{compute_storage_deposit, BasicOutput, Output, OutputFilter};

/// The signed part of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEssence {
    /// Network hrp the transaction is valid on.
    pub network: String,
    pub inputs: Vec<OutputId>,
    pub outputs: Vec<Output>,
}

impl TransactionEssence {
    /// Blake3 digest of the JSON-serialized essence.
    pub fn hash(&self) -> Result<[u8; 32], LedgerError> {
        let bytes =
            serde_json::to_vec(self).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Ok(tessera_crypto::hash(&bytes))
    }
}

/// A transaction signed by the owner of every input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub essence: TransactionEssence,
    pub public_key: PublicKey,
    /// Signature over the essence hash.
    pub signature: Signature,
}

impl Transaction {
    pub fn sign(essence: TransactionEssence, keypair: &KeyPair) -> Result<Self, LedgerError> {
        let signature = keypair.sign(&essence.hash()?);
        Ok(Self {
            essence,
            public_key: keypair.public_key(),
            signature,
        })
    }

    pub fn signer(&self) -> &PublicKey {
        &self.public_key
    }

    /// Address of the signer on the given network.
    pub fn signer_address(&self, hrp: &str) -> Result<Address, LedgerError> {
        Ok(Address::from_public_key_bytes(hrp, self.public_key.as_bytes())?)
    }

    pub fn verify_signature(&self) -> Result<(), LedgerError> {
        self.public_key
            .verify(&self.essence.hash()?, &self.signature)
            .map_err(|_| LedgerError::InvalidSignature)
    }

    /// blake3(essence hash ‖ signature bytes).
    pub fn id(&self) -> Result<TransactionId, LedgerError> {
        let essence = self.essence.hash()?;
        let signature = self.signature.to_bytes();
        let digest = tessera_crypto::hash_parts(&[essence.as_slice(), signature.as_slice()]);
        Ok(TransactionId::new(digest))
    }
}

/// Funds and signs a transaction from the basic outputs of one address.
///
/// Explicit inputs (typically the alias output being updated) are consumed
/// as given; plain basic outputs of the signer's address are then selected
/// until the outputs are covered and any change can carry its own deposit.
pub struct TransactionBuilder<'a> {
    client: &'a dyn LedgerClient,
    keypair: &'a KeyPair,
    inputs: Vec<OutputId>,
    outputs: Vec<Output>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(client: &'a dyn LedgerClient, keypair: &'a KeyPair) -> Self {
        Self {
            client,
            keypair,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: OutputId) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    pub async fn build(self) -> Result<Transaction, LedgerError> {
        let hrp = self.client.network_hrp().await?;
        let rent = self.client.rent_structure().await?;
        let address = Address::from_public_key_bytes(&hrp, self.keypair.public_key().as_bytes())?;

        let mut inputs = self.inputs;
        let mut outputs = self.outputs;

        let mut input_total: u64 = 0;
        for (_, output) in self.client.get_outputs(&inputs).await? {
            input_total = checked_add(input_total, output.amount())?;
        }
        let mut output_total: u64 = 0;
        for output in &outputs {
            output_total = checked_add(output_total, output.amount())?;
        }

        let remainder_deposit =
            compute_storage_deposit(&Output::Basic(BasicOutput::new(0, address.clone())), &rent);
        let balanced = |input_total: u64| {
            input_total == output_total
                || (input_total > output_total && input_total - output_total >= remainder_deposit)
        };

        if !balanced(input_total) {
            let candidates: Vec<OutputId> = self
                .client
                .basic_output_ids(&OutputFilter::spendable_by(&address))
                .await?
                .into_iter()
                .filter(|id| !inputs.contains(id))
                .collect();

            for (id, output) in self.client.get_outputs(&candidates).await? {
                if balanced(input_total) {
                    break;
                }
                input_total = checked_add(input_total, output.amount())?;
                inputs.push(id);
            }
        }

        if !balanced(input_total) {
            let required = if input_total > output_total {
                output_total + remainder_deposit
            } else {
                output_total
            };
            return Err(LedgerError::InsufficientFunds {
                available: input_total,
                required,
            });
        }

        if input_total > output_total {
            outputs.push(Output::Basic(BasicOutput::new(
                input_total - output_total,
                address.clone(),
            )));
        }

        tracing::debug!(
            address = %address,
            inputs = inputs.len(),
            outputs = outputs.len(),
            "Built transaction"
        );

        Transaction::sign(
            TransactionEssence {
                network: hrp,
                inputs,
                outputs,
            },
            self.keypair,
        )
    }
}

fn checked_add(a: u64, b: u64) -> Result<u64, LedgerError> {
    a.checked_add(b)
        .ok_or_else(|| LedgerError::InvalidTransaction("amount overflow".into()))
}
